use crate::core::kv::KeyValueCollection;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory collection for tests.
#[derive(Default)]
pub struct MemoryCollection {
    inner: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueCollection for MemoryCollection {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let entries = self.inner.lock().await;
        let value = entries.get(key).cloned();
        if value.is_some() {
            debug!("Store HIT for key: {}", String::from_utf8_lossy(key));
        } else {
            debug!("Store MISS for key: {}", String::from_utf8_lossy(key));
        }
        Ok(value)
    }

    async fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<bool> {
        let mut entries = self.inner.lock().await;
        if entries.get(key).map(Vec::as_slice) != expected {
            debug!("Store CAS conflict for key: {}", String::from_utf8_lossy(key));
            return Ok(false);
        }
        entries.insert(key.to_vec(), new.to_vec());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_compare_and_swap() {
        let collection = MemoryCollection::new();

        // Absent key only swaps when None is expected
        assert!(!collection.compare_and_swap(b"k", Some(b"x"), b"a").await.unwrap());
        assert!(collection.compare_and_swap(b"k", None, b"a").await.unwrap());
        assert_eq!(collection.get(b"k").await.unwrap(), Some(b"a".to_vec()));

        // Stale expectation loses
        assert!(!collection.compare_and_swap(b"k", None, b"b").await.unwrap());
        assert!(!collection.compare_and_swap(b"k", Some(b"z"), b"b").await.unwrap());
        assert_eq!(collection.get(b"k").await.unwrap(), Some(b"a".to_vec()));

        assert!(collection.compare_and_swap(b"k", Some(b"a"), b"b").await.unwrap());
        assert_eq!(collection.get(b"k").await.unwrap(), Some(b"b".to_vec()));
    }
}
