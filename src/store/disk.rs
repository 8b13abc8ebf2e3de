use crate::core::kv::KeyValueCollection;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use tokio::sync::Mutex;
use tracing::debug;

/// Collection backed by a fjall partition. Writes are synced before returning.
pub struct DiskCollection {
    keyspace: Keyspace,
    partition: PartitionHandle,
    // Serializes read-modify-write sequences issued through this handle
    write_lock: Mutex<()>,
}

impl DiskCollection {
    pub fn new(keyspace: Keyspace, partition: PartitionHandle) -> Self {
        Self {
            keyspace,
            partition,
            write_lock: Mutex::new(()),
        }
    }

    fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to persist keyspace")
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self
            .partition
            .get(key)
            .with_context(|| format!("Failed to read key: {}", String::from_utf8_lossy(key)))?
            .map(|v| v.to_vec());
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
        let _guard = self.write_lock.lock().await;
        let current = self
            .partition
            .get(key)
            .with_context(|| format!("Failed to read key: {}", String::from_utf8_lossy(key)))?;
        if current.as_deref() != expected {
            debug!("Store CAS conflict for key: {}", String::from_utf8_lossy(key));
            return Ok(false);
        }
        self.partition
            .insert(key, new)
            .with_context(|| format!("Failed to write key: {}", String::from_utf8_lossy(key)))?;
        self.persist()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fjall::PartitionCreateOptions;
    use tempfile::tempdir;

    fn open_collection(path: &std::path::Path) -> DiskCollection {
        let keyspace = fjall::Config::new(path).open().unwrap();
        let partition = keyspace
            .open_partition("test", PartitionCreateOptions::default())
            .unwrap();
        DiskCollection::new(keyspace, partition)
    }

    #[tokio::test]
    async fn test_disk_missing_key() {
        let dir = tempdir().unwrap();
        let collection = open_collection(dir.path());
        assert!(collection.get(b"key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disk_compare_and_swap() {
        let dir = tempdir().unwrap();
        let collection = open_collection(dir.path());

        assert!(collection.compare_and_swap(b"k", None, b"a").await.unwrap());
        assert!(!collection.compare_and_swap(b"k", None, b"b").await.unwrap());
        assert!(collection.compare_and_swap(b"k", Some(b"a"), b"b").await.unwrap());
        assert_eq!(collection.get(b"k").await.unwrap(), Some(b"b".to_vec()));
    }
}
