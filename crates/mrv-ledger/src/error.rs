//! Error types for the ledger module.

use mrv_core::CoreError;
use thiserror::Error;

/// Errors that can occur while talking to the ledger.
///
/// None of these reach a tracking session: [`crate::LedgerClient`] converts
/// them into `None`/`false` results plus a log line.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Network-level failure reaching the node.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node answered with something that is not a valid response.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// Contract call data or return data could not be encoded or decoded.
    #[error("abi error: {0}")]
    Abi(String),

    /// Transaction bytes are not valid RLP.
    #[error("rlp error: {0}")]
    Rlp(String),

    /// Key parsing, signing or sender recovery failed.
    #[error("signing error: {0}")]
    Signing(String),

    /// A configured value is malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The registry already holds an anchor for this id.
    #[error("record already registered: {0}")]
    AlreadyRegistered(String),

    /// No receipt arrived within the configured wait.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Core data model error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl From<reqwest::Error> for LedgerError {
    fn from(e: reqwest::Error) -> Self {
        LedgerError::Transport(e.to_string())
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
