//! # MRV Core
//!
//! Pure primitives for Measurement, Reporting, Verification (MRV) records:
//! the record data model, canonical serialization, and digests.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over record documents.
//!
//! ## Key Types
//!
//! - [`Record`] - One tracked training run
//! - [`RecordId`] - `MRV-<uuid>` identifier
//! - [`Digest`] - SHA-256 fingerprint of a record's canonical form
//!
//! ## Canonicalization
//!
//! Digests are computed over sorted-key, whitespace-free JSON with ASCII-only
//! output. See the [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod record;
pub mod timestamp;
pub mod types;
pub mod validation;

pub use canonical::{canonical_bytes, canonical_pretty, canonical_string};
pub use crypto::{hash_record, hash_value, Digest};
pub use error::{CoreError, Result, ValidationError};
pub use record::{
    EnergyEmissions, Experiment, Hardware, Record, RecordBuilder, Timestamps, Training,
    SCHEMA_VERSION, UNKNOWN,
};
pub use timestamp::{clamp_end, duration_between, now_iso, parse_iso};
pub use types::{RecordId, RECORD_ID_PREFIX};
pub use validation::{validate_record, validate_value};
