use std::sync::{Arc, Mutex};

use mdw_types::BlobRecord;
use tracing::{debug, warn};

use crate::error::CacheResult;
use crate::traits::KeyValueStore;

/// Key the browser app stored its record list under.
pub const DEFAULT_STORAGE_KEY: &str = "md2walrus_blobs";

/// Local mirror of blob records, keyed by display identifier.
///
/// All records live as one JSON array under a single key. Reads degrade to an
/// empty collection when the store is empty, unreadable, or holds something
/// that does not parse. Writes are serialized through an internal lock so
/// concurrent upserts do not lose each other's records.
pub struct LocalCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
    write_lock: Mutex<()>,
}

impl LocalCache {
    /// Cache over `store` under the default key.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_STORAGE_KEY)
    }

    /// Cache over `store` under a custom key, e.g. one per network.
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Insert a record, or merge it over the stored record with the same id.
    pub fn upsert(&self, record: BlobRecord) -> CacheResult<()> {
        let _guard = self.write_lock.lock().expect("cache lock poisoned");
        let mut records = self.load();
        match records.iter_mut().find(|r| r.blob_id() == record.blob_id()) {
            Some(existing) => {
                debug!(blob_id = record.blob_id(), "updating cached record");
                existing.merge_from(record);
            }
            None => {
                debug!(blob_id = record.blob_id(), "caching new record");
                records.push(record);
            }
        }
        self.persist(&records)
    }

    /// All records, newest `created_at` first. Records with an unparseable
    /// timestamp sort last.
    pub fn list(&self) -> Vec<BlobRecord> {
        let mut records = self.load();
        records.sort_by(|a, b| b.created_at_time().cmp(&a.created_at_time()));
        records
    }

    /// Look up a record by display identifier.
    pub fn get(&self, blob_id: &str) -> Option<BlobRecord> {
        self.load().into_iter().find(|r| r.blob_id() == blob_id)
    }

    /// Remove a record. Returns `true` if it was present.
    pub fn remove(&self, blob_id: &str) -> CacheResult<bool> {
        let _guard = self.write_lock.lock().expect("cache lock poisoned");
        let mut records = self.load();
        let before = records.len();
        records.retain(|r| r.blob_id() != blob_id);
        if records.len() == before {
            return Ok(false);
        }
        self.persist(&records)?;
        Ok(true)
    }

    /// Drop every cached record.
    pub fn clear(&self) -> CacheResult<()> {
        let _guard = self.write_lock.lock().expect("cache lock poisoned");
        self.store.remove(&self.key)?;
        Ok(())
    }

    fn load(&self) -> Vec<BlobRecord> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "cache store unreadable, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<BlobRecord>>(&raw) {
            Ok(records) => records.into_iter().filter(BlobRecord::is_valid).collect(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "cache contents corrupted, treating as empty");
                Vec::new()
            }
        }
    }

    fn persist(&self, records: &[BlobRecord]) -> CacheResult<()> {
        let json = serde_json::to_string(records)?;
        self.store.set(&self.key, &json)
    }
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache").field("key", &self.key).finish()
    }
}
