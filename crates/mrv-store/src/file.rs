//! Directory-backed implementation of the RecordStore trait.
//!
//! This is the primary storage backend. Each record is a UTF-8 file
//! `<dir>/<id>.json` holding indented, key-sorted JSON.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use mrv_core::{canonical_pretty, Record, RecordId, RECORD_ID_PREFIX};

use crate::error::Result;
use crate::traits::RecordStore;

/// Default storage directory, relative to the working directory.
pub const DEFAULT_STORAGE_DIR: &str = "mrv_data";

const RECORD_EXTENSION: &str = "json";

/// File-per-record store.
///
/// Writes are whole-file overwrites; a crash mid-write can leave a truncated
/// file behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(path = %dir.display(), "record store opened");
        Ok(Self { dir })
    }

    /// The storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path where the record with `id` is stored.
    pub fn path_for(&self, id: &RecordId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    /// Load a record's raw JSON document, `None` if absent.
    ///
    /// Unlike [`RecordStore::load`] this keeps fields the typed model does
    /// not know about.
    pub fn load_value(&self, id: &RecordId) -> Result<Option<Value>> {
        match fs::read_to_string(self.path_for(id)) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Extract a record id from a `MRV-*.json` file name.
fn id_from_file_name(path: &Path) -> Option<RecordId> {
    if path.extension()?.to_str()? != RECORD_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if !stem.starts_with(RECORD_ID_PREFIX) {
        return None;
    }
    RecordId::parse(stem).ok()
}

impl RecordStore for FileStore {
    fn save(&self, record: &Record, id: Option<&RecordId>) -> Result<RecordId> {
        let id = id.unwrap_or(&record.id).clone();
        let path = self.path_for(&id);

        fs::write(&path, record.to_pretty_json()?)?;

        info!(mrv_id = %id, path = %path.display(), "MRV record saved");
        Ok(id)
    }

    fn load(&self, id: &RecordId) -> Result<Option<Record>> {
        match self.load_value(id)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<RecordId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(id) = id_from_file_name(&entry.path()) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn export(&self, id: &RecordId, destination: &Path) -> Result<bool> {
        match self.load_value(id)? {
            Some(value) => {
                fs::write(destination, canonical_pretty(&value)?)?;
                debug!(mrv_id = %id, path = %destination.display(), "record exported");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
