//! RecordStore trait: the abstract interface for record persistence.
//!
//! This trait keeps the tracking session storage-agnostic. Implementations
//! include a JSON directory (primary) and in-memory (for tests).

use std::path::Path;

use mrv_core::{Record, RecordId};

use crate::error::Result;

/// The RecordStore trait: synchronous interface for record persistence.
///
/// # Design Notes
///
/// - **Overwrite on save**: saving under an existing id replaces the stored
///   copy, no merge.
/// - **Not found is a value**: `load` returns `Ok(None)` for unknown ids and
///   reserves `Err` for unreadable or malformed data.
/// - **Unordered listing**: `list` makes no ordering promise.
pub trait RecordStore: Send + Sync {
    /// Issue a fresh `MRV-<uuid>` identifier.
    fn generate_id(&self) -> RecordId {
        RecordId::generate()
    }

    /// Persist a record.
    ///
    /// # Arguments
    /// - `record`: The record to write.
    /// - `id`: Storage key; defaults to `record.id`.
    ///
    /// # Returns
    /// The id the record was stored under.
    fn save(&self, record: &Record, id: Option<&RecordId>) -> Result<RecordId>;

    /// Load a record by id, `None` if absent.
    fn load(&self, id: &RecordId) -> Result<Option<Record>>;

    /// All stored record ids.
    fn list(&self) -> Result<Vec<RecordId>>;

    /// Write a stored record's indented JSON to an arbitrary path.
    ///
    /// Returns `false` if the id is unknown.
    fn export(&self, id: &RecordId, destination: &Path) -> Result<bool> {
        match self.load(id)? {
            Some(record) => {
                std::fs::write(destination, record.to_pretty_json()?)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    fn generate_id(&self) -> RecordId {
        (**self).generate_id()
    }

    fn save(&self, record: &Record, id: Option<&RecordId>) -> Result<RecordId> {
        (**self).save(record, id)
    }

    fn load(&self, id: &RecordId) -> Result<Option<Record>> {
        (**self).load(id)
    }

    fn list(&self) -> Result<Vec<RecordId>> {
        (**self).list()
    }

    fn export(&self, id: &RecordId, destination: &Path) -> Result<bool> {
        (**self).export(id, destination)
    }
}
