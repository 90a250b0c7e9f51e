//! # MRV
//!
//! Measurement, Reporting and Verification for ML training runs: measure a
//! run's energy use, write a tamper-evident record, and anchor its digest on
//! a ledger so anyone holding the file can check it later.
//!
//! ## Overview
//!
//! - **Track**: a [`TrackingSession`] wraps the workload, measures it and
//!   produces a [`Record`]
//! - **Store**: records are saved as sorted, indented JSON files
//! - **Anchor**: the record's SHA-256 digest is registered on-chain
//! - **Verify**: a [`Verifier`] recomputes a file's digest and compares it
//!   with the anchor
//!
//! Anchoring and registry upload are best-effort. A ledger outage never
//! costs the record itself.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mrv::{init_logging, SessionConfig, TrackingSession};
//!
//! fn train() {}
//!
//! init_logging();
//! let config = SessionConfig::new("resnet-cifar10")
//!     .with_model_name("ResNet-18")
//!     .with_dataset_name("CIFAR-10")
//!     .with_epochs(10);
//!
//! let mut session = TrackingSession::new(config).unwrap();
//! session.track(train).unwrap();
//!
//! println!("MRV ID: {}", session.mrv_id().unwrap());
//! ```
//!
//! ## Re-exports
//!
//! - `mrv::core` - Record model, canonical JSON, digests
//! - `mrv::store` - Record storage
//! - `mrv::ledger` - Ledger client and in-process node

pub mod config;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod measurement;
pub mod registry;
pub mod session;
pub mod summary;
pub mod verify;

pub use mrv_core as core;
pub use mrv_ledger as ledger;
pub use mrv_store as store;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use hardware::{HardwareProbe, StaticProbe, SystemProbe};
pub use logging::init_logging;
pub use measurement::{CpuPowerMeter, MeasurementSource, NullMeter};
pub use registry::{HttpRegistry, RegistrySink};
pub use session::{SessionGuard, SessionState, TrackingSession};
pub use summary::{format_duration, SessionSummary};
pub use verify::{VerificationOutcome, VerificationReport, Verifier};

pub use mrv_core::{Digest, Record, RecordId};
pub use mrv_ledger::{LedgerClient, LedgerConfig, TxHash};
