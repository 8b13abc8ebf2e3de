//! Persisted notification state and the store abstraction it lives behind

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What we remember about the last notification. Replaced as a whole, never field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationState {
    pub last_notified_rate: Option<f64>,
    #[serde(default)]
    pub notifications_sent_today: u32,
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl NotificationState {
    pub fn is_empty(&self) -> bool {
        self.last_notified_rate.is_none() && self.last_notified_at.is_none()
    }
}

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Returns the stored state, or the empty state if nothing was ever written.
    async fn load(&self) -> Result<NotificationState>;

    /// Writes `new` only if the stored state still equals `expected`.
    /// Returns `false` when another writer got there first.
    async fn compare_and_set(
        &self,
        expected: &NotificationState,
        new: &NotificationState,
    ) -> Result<bool>;
}
