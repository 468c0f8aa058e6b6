//! Transaction history store
//!
//! Bridge transactions are kept as one JSON array, newest first, under
//! [`HISTORY_KEY`] in a [`KeyValueStore`]. Updates are read-modify-write
//! with no locking: two writers interleaving load/store will lose one
//! writer's update (last write wins).

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::error::BridgeError;
use crate::types::{BridgeTransactionRecord, TxStatus};

/// Storage key of the transaction list
pub const HISTORY_KEY: &str = "layerleap_bridge_transactions";

/// String key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, BridgeError>;

    fn set(&self, key: &str, value: &str) -> Result<(), BridgeError>;
}

/// One `<key>.json` file per key in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, BridgeError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BridgeError::Storage(format!("read {}: {}", key, e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| BridgeError::Storage(format!("create {}: {}", self.dir.display(), e)))?;
        // Write beside the target, then rename over it, so a crash never
        // leaves a truncated file
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)
            .map_err(|e| BridgeError::Storage(format!("write {}: {}", key, e)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| BridgeError::Storage(format!("replace {}: {}", key, e)))
    }
}

/// Process-local storage
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, BridgeError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| BridgeError::Storage("memory store poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| BridgeError::Storage("memory store poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Bridge transaction log
#[derive(Clone)]
pub struct TransactionHistory {
    store: Arc<dyn KeyValueStore>,
}

impl TransactionHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Stored records, failing on storage or parse errors
    pub fn load(&self) -> Result<Vec<BridgeTransactionRecord>, BridgeError> {
        match self.store.get(HISTORY_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the stored list
    pub fn store(&self, records: &[BridgeTransactionRecord]) -> Result<(), BridgeError> {
        let json = serde_json::to_string(records)?;
        self.store.set(HISTORY_KEY, &json)
    }

    /// Stored records, newest first; empty if storage is absent or unreadable
    pub fn get_transaction_history(&self) -> Vec<BridgeTransactionRecord> {
        self.load().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read transaction history");
            Vec::new()
        })
    }

    /// Prepend a record
    pub fn save_transaction(&self, record: BridgeTransactionRecord) -> Result<(), BridgeError> {
        let mut records = self.get_transaction_history();
        debug!(tx_hash = %record.hash, existing = records.len(), "Saving transaction");
        records.insert(0, record);
        self.store(&records)
    }

    /// Move a pending record to `status`
    ///
    /// Hashes compare case-insensitively. Returns `false` when no pending
    /// record matches or the transition is not allowed.
    pub fn update_transaction_status(
        &self,
        hash: &str,
        status: TxStatus,
    ) -> Result<bool, BridgeError> {
        let mut records = self.get_transaction_history();
        let Some(record) = records
            .iter_mut()
            .find(|r| r.hash.eq_ignore_ascii_case(hash))
        else {
            return Ok(false);
        };

        if !record.status.can_transition_to(status) {
            debug!(tx_hash = hash, from = %record.status, to = %status, "Ignoring status change");
            return Ok(false);
        }
        record.status = status;
        self.store(&records)?;
        Ok(true)
    }

    pub fn pending(&self) -> Vec<BridgeTransactionRecord> {
        self.get_transaction_history()
            .into_iter()
            .filter(|r| r.status == TxStatus::Pending)
            .collect()
    }
}
