//! Verification of a local record file against its on-chain anchor.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat};
use serde_json::Value;
use tracing::debug;

use mrv_core::{hash_value, Digest};
use mrv_ledger::{LedgerAnchor, LedgerClient, RpcTransport};

use crate::error::Result;

/// The four terminal results of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Local digest equals the anchored digest.
    Valid,
    /// An anchor exists but its digest differs from the local one.
    Tampered { local: Digest, on_chain: Digest },
    /// The ledger has no anchor for the id.
    NotFound,
    /// The ledger node could not be reached.
    NotConnected,
}

impl VerificationOutcome {
    /// Process exit code for the verification tool.
    pub fn exit_code(&self) -> u8 {
        match self {
            VerificationOutcome::Valid => 0,
            VerificationOutcome::Tampered { .. } => 2,
            VerificationOutcome::NotFound => 3,
            VerificationOutcome::NotConnected => 4,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid)
    }
}

/// Everything learned while verifying one record.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub id: String,
    pub path: Option<PathBuf>,
    pub local_digest: Digest,
    pub anchor: Option<LedgerAnchor>,
    pub outcome: VerificationOutcome,
}

/// Render a ledger timestamp as ISO-8601 UTC.
pub fn format_ledger_time(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, false))
        .unwrap_or_else(|| timestamp.to_string())
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "MRV VERIFICATION")?;
        writeln!(f, "{}", rule)?;
        if let Some(path) = &self.path {
            writeln!(f, "Loaded:          {}", path.display())?;
        }
        writeln!(f, "Computed hash:   {}", self.local_digest)?;

        if self.outcome == VerificationOutcome::NotConnected {
            writeln!(f, "Ledger:          not connected")?;
            writeln!(f)?;
            writeln!(f, "NOT CONNECTED - could not reach the ledger node")?;
            return write!(f, "{}", rule);
        }
        writeln!(f, "Ledger:          connected")?;
        writeln!(f, "Record ID:       {}", self.id)?;

        if let Some(anchor) = &self.anchor {
            writeln!(f, "On-chain hash:   {}", anchor.digest)?;
            writeln!(f, "Timestamp:       {}", format_ledger_time(anchor.timestamp))?;
            writeln!(f, "Submitter:       {}", anchor.submitter)?;
        }
        writeln!(f)?;

        match &self.outcome {
            VerificationOutcome::Valid => writeln!(f, "VALID - hashes match, data integrity verified")?,
            VerificationOutcome::Tampered { local, on_chain } => {
                writeln!(f, "TAMPERED - hash mismatch")?;
                writeln!(f, "  Local:         {}", local)?;
                writeln!(f, "  On-chain:      {}", on_chain)?;
            }
            VerificationOutcome::NotFound => writeln!(f, "NOT FOUND - no anchor for this id")?,
            VerificationOutcome::NotConnected => {}
        }
        write!(f, "{}", rule)
    }
}

/// Checks local record content against the ledger.
pub struct Verifier<T: RpcTransport> {
    ledger: LedgerClient<T>,
}

impl<T: RpcTransport> Verifier<T> {
    pub fn new(ledger: LedgerClient<T>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &LedgerClient<T> {
        &self.ledger
    }

    /// Verify the record file at `path` against the anchor stored for `id`.
    ///
    /// The digest covers the file's exact JSON content, including fields
    /// the record model does not know. A missing or malformed file is an
    /// error; every ledger-side result is an outcome.
    pub fn verify_file(&self, id: &str, path: &Path) -> Result<VerificationReport> {
        let text = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        let mut report = self.verify_value(id, &value)?;
        report.path = Some(path.to_path_buf());
        Ok(report)
    }

    /// Verify an in-memory record document.
    pub fn verify_value(&self, id: &str, value: &Value) -> Result<VerificationReport> {
        let local_digest = hash_value(value)?;
        debug!(mrv_id = id, digest = %local_digest, "computed local digest");

        let (anchor, outcome) = if !self.ledger.is_connected() {
            (None, VerificationOutcome::NotConnected)
        } else {
            match self.ledger.get(id) {
                None => (None, VerificationOutcome::NotFound),
                Some(anchor) if anchor.digest == local_digest => {
                    (Some(anchor), VerificationOutcome::Valid)
                }
                Some(anchor) => (
                    Some(anchor),
                    VerificationOutcome::Tampered {
                        local: local_digest,
                        on_chain: anchor.digest,
                    },
                ),
            }
        };

        Ok(VerificationReport {
            id: id.to_string(),
            path: None,
            local_digest,
            anchor,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrv_ledger::MemoryChain;
    use serde_json::json;
    use std::sync::Arc;

    fn verifier(chain: &Arc<MemoryChain>) -> Verifier<Arc<MemoryChain>> {
        let config = chain
            .client_config()
            .with_private_key(&"22".repeat(32))
            .with_poll_interval(std::time::Duration::from_millis(1));
        Verifier::new(LedgerClient::new(Arc::clone(chain), config).unwrap())
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(VerificationOutcome::Valid.exit_code(), 0);
        let tampered = VerificationOutcome::Tampered {
            local: Digest::ZERO,
            on_chain: Digest::ZERO,
        };
        assert_eq!(tampered.exit_code(), 2);
        assert_eq!(VerificationOutcome::NotFound.exit_code(), 3);
        assert_eq!(VerificationOutcome::NotConnected.exit_code(), 4);
    }

    #[test]
    fn test_outcomes_on_values() {
        let chain = Arc::new(MemoryChain::new());
        let v = verifier(&chain);
        let doc = json!({"id": "MRV-v", "n": 1});

        let report = v.verify_value("MRV-v", &doc).unwrap();
        assert_eq!(report.outcome, VerificationOutcome::NotFound);

        let digest = hash_value(&doc).unwrap();
        v.ledger().anchor("MRV-v", &digest).unwrap();
        let report = v.verify_value("MRV-v", &doc).unwrap();
        assert!(report.outcome.is_valid());
        assert_eq!(report.anchor.unwrap().digest, digest);

        let edited = json!({"id": "MRV-v", "n": 2});
        let report = v.verify_value("MRV-v", &edited).unwrap();
        assert_eq!(
            report.outcome,
            VerificationOutcome::Tampered {
                local: hash_value(&edited).unwrap(),
                on_chain: digest,
            }
        );

        chain.set_online(false);
        let report = v.verify_value("MRV-v", &doc).unwrap();
        assert_eq!(report.outcome, VerificationOutcome::NotConnected);
        assert_eq!(report.local_digest, digest);
    }

    #[test]
    fn test_missing_file_is_error() {
        let chain = Arc::new(MemoryChain::new());
        let v = verifier(&chain);
        assert!(v
            .verify_file("MRV-x", Path::new("/nonexistent/MRV-x.json"))
            .is_err());
    }

    #[test]
    fn test_report_display() {
        let chain = Arc::new(MemoryChain::new());
        let v = verifier(&chain);
        let doc = json!({"a": 1});
        let digest = hash_value(&doc).unwrap();
        v.ledger().anchor("MRV-d", &digest).unwrap();

        let text = v.verify_value("MRV-d", &doc).unwrap().to_string();
        assert!(text.contains(&format!("Computed hash:   {}", digest)));
        assert!(text.contains("VALID"));
        assert!(text.contains("Submitter:       0x"));

        chain.set_online(false);
        let text = v.verify_value("MRV-d", &doc).unwrap().to_string();
        assert!(text.contains("NOT CONNECTED"));
        assert!(text.contains(&digest.to_string()));
    }

    #[test]
    fn test_format_ledger_time() {
        assert_eq!(format_ledger_time(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(format_ledger_time(1_700_000_000), "2023-11-14T22:13:20+00:00");
    }
}
