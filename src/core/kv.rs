//! Key-value storage abstractions

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A named collection of byte keys and values.
#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Stores `new` under `key` only if the current value equals `expected`
    /// (`None` meaning the key is absent). Returns whether the swap happened.
    async fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<bool>;
}

pub trait Store: Send + Sync {
    /// Opens the collection `name`, creating it on first use.
    fn get_collection(&self, name: &str) -> Result<Arc<dyn KeyValueCollection>>;
}
