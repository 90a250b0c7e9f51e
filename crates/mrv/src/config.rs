//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

use mrv_core::UNKNOWN;
use mrv_ledger::LedgerConfig;
use mrv_store::file::DEFAULT_STORAGE_DIR;

/// Default sampling interval for measurement sources.
pub const DEFAULT_MEASURE_INTERVAL: Duration = Duration::from_secs(15);

/// Everything a [`crate::TrackingSession`] needs to know about the run and
/// where its record goes.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Experiment name; the only required field.
    pub experiment_name: String,
    pub model_name: String,
    pub dataset_name: String,
    pub epochs: Option<u64>,
    pub batch_size: Option<u64>,
    /// ML framework, e.g. "PyTorch".
    pub framework: String,
    /// Directory records are written to.
    pub storage_dir: PathBuf,
    /// Base URL of an external registry API; no upload when unset.
    pub registry_url: Option<String>,
    /// Whether to talk to the ledger at all.
    pub blockchain_enabled: bool,
    /// Anchor the record digest as part of `stop()`.
    pub auto_anchor: bool,
    /// Measurement sampling interval.
    pub measure_interval: Duration,
    /// Grid carbon intensity used to derive `co2_kg` from energy.
    pub carbon_intensity_kg_per_kwh: Option<f64>,
    /// Ledger connection settings.
    pub ledger: LedgerConfig,
}

impl SessionConfig {
    /// Defaults for everything but the experiment name. Ledger settings are
    /// read from the environment (see [`LedgerConfig::from_env`]).
    pub fn new(experiment_name: impl Into<String>) -> Self {
        Self {
            experiment_name: experiment_name.into(),
            model_name: UNKNOWN.to_string(),
            dataset_name: UNKNOWN.to_string(),
            epochs: None,
            batch_size: None,
            framework: UNKNOWN.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            registry_url: None,
            blockchain_enabled: true,
            auto_anchor: true,
            measure_interval: DEFAULT_MEASURE_INTERVAL,
            carbon_intensity_kg_per_kwh: None,
            ledger: LedgerConfig::from_env(),
        }
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_dataset_name(mut self, name: impl Into<String>) -> Self {
        self.dataset_name = name.into();
        self
    }

    pub fn with_epochs(mut self, epochs: u64) -> Self {
        self.epochs = Some(epochs);
        self
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = framework.into();
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = Some(url.into());
        self
    }

    pub fn with_blockchain(mut self, enabled: bool) -> Self {
        self.blockchain_enabled = enabled;
        self
    }

    pub fn with_auto_anchor(mut self, auto_anchor: bool) -> Self {
        self.auto_anchor = auto_anchor;
        self
    }

    pub fn with_measure_interval(mut self, interval: Duration) -> Self {
        self.measure_interval = interval;
        self
    }

    pub fn with_carbon_intensity(mut self, kg_per_kwh: f64) -> Self {
        self.carbon_intensity_kg_per_kwh = Some(kg_per_kwh);
        self
    }

    pub fn with_ledger(mut self, ledger: LedgerConfig) -> Self {
        self.ledger = ledger;
        self
    }

    /// CO2 for `energy_kwh`, or 0.0 without a configured intensity.
    pub fn co2_for(&self, energy_kwh: f64) -> f64 {
        match self.carbon_intensity_kg_per_kwh {
            Some(intensity) if intensity.is_finite() && intensity >= 0.0 => {
                crate::measurement::round6(energy_kwh * intensity)
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("exp");
        assert_eq!(config.model_name, "Unknown");
        assert_eq!(config.storage_dir, PathBuf::from("mrv_data"));
        assert!(config.blockchain_enabled);
        assert!(config.auto_anchor);
        assert_eq!(config.measure_interval, Duration::from_secs(15));
        assert!(config.registry_url.is_none());
    }

    #[test]
    fn test_co2_derivation() {
        let config = SessionConfig::new("exp");
        assert_eq!(config.co2_for(2.0), 0.0);

        let config = config.with_carbon_intensity(0.475);
        assert_eq!(config.co2_for(2.0), 0.95);
        assert_eq!(config.co2_for(0.0), 0.0);
    }

    #[test]
    fn test_invalid_intensity_ignored() {
        let config = SessionConfig::new("exp").with_carbon_intensity(f64::NAN);
        assert_eq!(config.co2_for(1.0), 0.0);
    }
}
