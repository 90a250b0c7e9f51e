//! Upload of finished records to an external registry API.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use mrv_core::Record;

use crate::error::{Result, SessionError};

/// Timeout for a registry upload.
pub const REGISTRY_TIMEOUT: Duration = Duration::from_secs(10);

/// A place finished records are forwarded to.
pub trait RegistrySink: Send {
    fn upload(&self, record: &Record) -> Result<()>;
}

/// POSTs the record JSON to `<base_url>/api/mrv`. Only `201 Created`
/// counts as success.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpRegistry {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REGISTRY_TIMEOUT)
            .build()
            .map_err(|e| SessionError::Registry(e.to_string()))?;
        Ok(Self {
            endpoint: format!("{}/api/mrv", base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RegistrySink for HttpRegistry {
    fn upload(&self, record: &Record) -> Result<()> {
        let body = record.to_value()?;
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| SessionError::Registry(e.to_string()))?;

        match response.status() {
            StatusCode::CREATED => {
                debug!(mrv_id = %record.id, endpoint = %self.endpoint, "record uploaded to registry");
                Ok(())
            }
            status => Err(SessionError::Registry(format!(
                "registry answered {} for {}",
                status, self.endpoint
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrv_core::RecordBuilder;

    #[test]
    fn test_endpoint() {
        assert_eq!(
            HttpRegistry::new("https://registry.example/").unwrap().endpoint(),
            "https://registry.example/api/mrv"
        );
        assert_eq!(
            HttpRegistry::new("http://localhost:5000").unwrap().endpoint(),
            "http://localhost:5000/api/mrv"
        );
    }

    #[test]
    fn test_unreachable_registry_is_error() {
        let record = RecordBuilder::new("registry")
            .timestamps("2024-01-01T00:00:00+00:00", "2024-01-01T00:00:01+00:00")
            .build()
            .unwrap();
        let registry = HttpRegistry::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            registry.upload(&record),
            Err(SessionError::Registry(_))
        ));
    }
}
