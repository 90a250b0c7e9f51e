//! # MRV Store
//!
//! Local persistence for MRV records. Provides a trait-based interface with a
//! directory-of-JSON-files implementation and an in-memory one.
//!
//! ## Key Types
//!
//! - [`RecordStore`] - The trait for all storage operations
//! - [`FileStore`] - One `<id>.json` file per record in a directory
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mrv_store::{FileStore, RecordStore};
//!
//! let store = FileStore::open("mrv_data").unwrap();
//! for id in store.list().unwrap() {
//!     println!("{}", id);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Whole-file overwrite**: saving an existing id replaces the file
//! - **Absent is not an error**: `load` of an unknown id returns `Ok(None)`
//! - **No locking**: every record lives at a path derived from its unique id

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::RecordStore;
