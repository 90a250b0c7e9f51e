//! In-memory implementation of the RecordStore trait.
//!
//! This is primarily for testing. It has the same semantics as the file
//! store but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use mrv_core::{Record, RecordId};

use crate::error::{Result, StoreError};
use crate::traits::RecordStore;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<RecordId, Record>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn save(&self, record: &Record, id: Option<&RecordId>) -> Result<RecordId> {
        let id = id.unwrap_or(&record.id).clone();
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        records.insert(id.clone(), record.clone());
        Ok(id)
    }

    fn load(&self, id: &RecordId) -> Result<Option<Record>> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<RecordId>> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.keys().cloned().collect())
    }
}
