pub mod disk;
#[cfg(test)]
pub mod memory;
pub mod state;

use crate::core::kv::{KeyValueCollection, Store};
use anyhow::{Context, Result, anyhow, bail};
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions};
use std::{
    collections::HashMap,
    fs::{File, OpenOptions, TryLockError},
    path::Path,
    sync::{Arc, RwLock},
};
use tracing::debug;

const LOCK_FILE: &str = "ratewatch.lock";

/// A thread-safe key-value store that can hold multiple collections, each a fjall partition.
///
/// The data directory is locked exclusively for as long as the store lives, so two processes
/// never write the same keyspace.
pub struct KeyValueStore {
    collections: RwLock<HashMap<String, Arc<dyn KeyValueCollection>>>,
    keyspace: Keyspace,
    // Dropped last; closing the file releases the lock
    _lock: File,
}

impl KeyValueStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        let lock = lock_data_dir(path)?;
        let keyspace = fjall::Config::new(path.join("state"))
            .open()
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        debug!("Opened store at {}", path.display());

        Ok(Self {
            collections: RwLock::new(HashMap::new()),
            keyspace,
            _lock: lock,
        })
    }
}

fn lock_data_dir(path: &Path) -> Result<File> {
    let lock_path = path.join(LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
    match file.try_lock() {
        Ok(()) => Ok(file),
        Err(TryLockError::WouldBlock) => bail!(
            "Data directory {} is in use by another ratewatch process (is `watch` running?)",
            path.display()
        ),
        Err(TryLockError::Error(e)) => {
            Err(e).with_context(|| format!("Failed to lock {}", lock_path.display()))
        }
    }
}

impl Store for KeyValueStore {
    fn get_collection(&self, name: &str) -> Result<Arc<dyn KeyValueCollection>> {
        if let Some(collection) = self
            .collections
            .read()
            .map_err(|_| anyhow!("Store lock poisoned"))?
            .get(name)
        {
            return Ok(Arc::clone(collection));
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| anyhow!("Store lock poisoned"))?;
        if let Some(collection) = collections.get(name) {
            return Ok(Arc::clone(collection));
        }

        let partition = self
            .keyspace
            .open_partition(name, PartitionCreateOptions::default())
            .with_context(|| format!("Failed to open collection: {name}"))?;
        let collection: Arc<dyn KeyValueCollection> =
            Arc::new(DiskCollection::new(self.keyspace.clone(), partition));
        collections.insert(name.to_string(), Arc::clone(&collection));
        Ok(collection)
    }
}
