//! Strong type definitions for MRV records.
//!
//! Identifiers are newtypes so a free-form string can never be used where a
//! record id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Prefix carried by every record identifier.
pub const RECORD_ID_PREFIX: &str = "MRV-";

/// Length of a hyphenated UUID string.
const UUID_LEN: usize = 36;

/// A record identifier of the form `MRV-<uuid>`.
///
/// Freshly generated ids always carry a v4 UUID. Parsed ids only need the
/// prefix and a non-empty suffix of ASCII alphanumerics and hyphens, which
/// keeps them safe to use as file names.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh identifier from a random 128-bit UUID.
    pub fn generate() -> Self {
        Self(format!("{}{}", RECORD_ID_PREFIX, uuid::Uuid::new_v4()))
    }

    /// Parse an identifier, rejecting anything that could escape a directory.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let suffix = s
            .strip_prefix(RECORD_ID_PREFIX)
            .ok_or_else(|| CoreError::InvalidRecordId(s.to_string()))?;

        if suffix.is_empty()
            || !suffix
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(CoreError::InvalidRecordId(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }

    /// Whether the suffix is a well-formed 36-character UUID.
    pub fn is_canonical(&self) -> bool {
        let suffix = &self.0[RECORD_ID_PREFIX.len()..];
        suffix.len() == UUID_LEN && uuid::Uuid::parse_str(suffix).is_ok()
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name used when persisting the record.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for RecordId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}
