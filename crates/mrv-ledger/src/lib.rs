//! # MRV Ledger
//!
//! Anchors record digests in an on-chain registry contract and looks them
//! up again for verification.
//!
//! ## Overview
//!
//! The ledger is an optional enhancement to tracking. A [`LedgerClient`]
//! that cannot reach its node, or has no contract or key configured, turns
//! every operation into a logged no-op instead of an error.
//!
//! ## Key Types
//!
//! - [`LedgerConfig`] - RPC endpoint, contract, key and timing settings
//! - [`LedgerClient`] - `anchor` / `get` / `verify` / `is_registered`
//! - [`RpcTransport`] - JSON-RPC seam; [`HttpTransport`] for real nodes
//! - [`MemoryChain`] - In-process node hosting the registry, for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mrv_core::Digest;
//! use mrv_ledger::{LedgerClient, LedgerConfig};
//!
//! let client = LedgerClient::http(LedgerConfig::from_env()).unwrap();
//! let digest = Digest::hash(b"record bytes");
//! if let Some(tx) = client.anchor("MRV-1234", &digest) {
//!     println!("anchored in {}", tx);
//! }
//! ```
//!
//! ## Transaction Flow
//!
//! ```text
//! client                                node
//!   |-- eth_call isRegistered ---------->|
//!   |-- eth_getTransactionCount -------->|
//!   |-- eth_gasPrice / eth_chainId ----->|
//!   |-- eth_sendRawTransaction --------->|
//!   |-- eth_getTransactionReceipt (poll)>|
//! ```

pub mod abi;
pub mod client;
pub mod config;
pub mod error;
pub mod eth;
pub mod memory;
pub mod rlp;
pub mod transport;
pub mod tx;

pub use client::{LedgerAnchor, LedgerClient};
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use eth::{Address, TxHash};
pub use memory::MemoryChain;
pub use transport::{HttpTransport, RpcTransport};
pub use tx::{LegacyTransaction, SignedTransaction, Signer};
