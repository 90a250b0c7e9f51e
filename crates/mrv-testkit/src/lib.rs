//! # MRV Testkit
//!
//! Testing utilities for MRV.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Pinned canonical encodings and digests
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Scratch stores, an in-process ledger and scripted collaborators
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the digest format that anchors depend on:
//!
//! ```rust
//! use mrv_testkit::vectors::{all_vectors, compute};
//!
//! for vector in all_vectors() {
//!     let (_, digest) = compute(&vector);
//!     assert_eq!(digest.to_hex(), vector.digest);
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use mrv_testkit::generators::{RecordParams, record_from_params};
//!
//! proptest! {
//!     #[test]
//!     fn digest_is_deterministic(params: RecordParams) {
//!         let r1 = record_from_params(&params);
//!         let r2 = record_from_params(&params);
//!         prop_assert_eq!(r1.digest().unwrap(), r2.digest().unwrap());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use mrv_testkit::fixtures::{ScriptedMeter, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let mut session = fixture.session(fixture.config("demo"), ScriptedMeter::new(0.5));
//! session.track(|| ()).unwrap();
//! assert!(session.verify_on_blockchain());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    multi_submitter_fixtures, random_private_key, sample_record, RecordingRegistry,
    ScriptedMeter, TestFixture, DEV_PRIVATE_KEY,
};
pub use generators::{record_from_params, RecordParams};
pub use vectors::{all_vectors, compute, verify_all_vectors, GoldenVector};
