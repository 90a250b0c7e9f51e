//! Error types for tracking sessions and verification.

use mrv_core::{CoreError, ValidationError};
use mrv_ledger::LedgerError;
use mrv_store::StoreError;
use thiserror::Error;

use crate::session::SessionState;

/// Errors that can occur while tracking or verifying a run.
///
/// Only the must-succeed path (measure, build, persist) returns these.
/// Registry and ledger failures are logged and swallowed by the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Record model or encoding error.
    #[error("record error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Ledger setup error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The measurement source could not start.
    #[error("measurement error: {0}")]
    Measurement(String),

    /// The external registry rejected or never received the record.
    #[error("registry error: {0}")]
    Registry(String),

    /// Operation not allowed in the session's current state.
    #[error("invalid session state: cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// I/O error reading a record file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record file is not valid JSON.
    #[error("malformed record file: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ValidationError> for SessionError {
    fn from(e: ValidationError) -> Self {
        SessionError::Core(CoreError::Validation(e))
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
