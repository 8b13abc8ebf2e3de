use crate::core::kv::KeyValueCollection;
use crate::core::state::{NotificationState, StateStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub const STATE_COLLECTION: &str = "alerts";
const STATE_KEY: &[u8] = b"notification_state";

/// Keeps [`NotificationState`] as a single JSON record so every update replaces all
/// fields at once.
pub struct KvStateStore {
    collection: Arc<dyn KeyValueCollection>,
}

impl KvStateStore {
    pub fn new(collection: Arc<dyn KeyValueCollection>) -> Self {
        Self { collection }
    }

    fn decode(raw: Option<&[u8]>) -> Result<NotificationState> {
        match raw {
            Some(bytes) => {
                serde_json::from_slice(bytes).context("Failed to decode notification state")
            }
            None => Ok(NotificationState::default()),
        }
    }
}

#[async_trait]
impl StateStore for KvStateStore {
    async fn load(&self) -> Result<NotificationState> {
        let raw = self.collection.get(STATE_KEY).await?;
        Self::decode(raw.as_deref())
    }

    async fn compare_and_set(
        &self,
        expected: &NotificationState,
        new: &NotificationState,
    ) -> Result<bool> {
        let raw = self.collection.get(STATE_KEY).await?;
        if Self::decode(raw.as_deref())? != *expected {
            return Ok(false);
        }
        let bytes = serde_json::to_vec(new).context("Failed to encode notification state")?;
        self.collection
            .compare_and_swap(STATE_KEY, raw.as_deref(), &bytes)
            .await
    }
}
