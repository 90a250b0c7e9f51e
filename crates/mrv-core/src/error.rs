//! Error types for MRV core.

use thiserror::Error;

/// Core errors that can occur while handling records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid record id: {0}")]
    InvalidRecordId(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("non-finite number cannot be canonicalized")]
    NonFiniteNumber,

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            CoreError::DecodingError(e.to_string())
        } else {
            CoreError::EncodingError(e.to_string())
        }
    }
}

/// Validation errors for record structure.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("end_time {end} precedes start_time {start}")]
    EndBeforeStart { start: String, end: String },

    #[error("unsupported schema version: {0}")]
    UnsupportedSchema(String),

    #[error("structural error: {0}")]
    StructuralError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
