//! Record: the MRV document describing one tracked training run.
//!
//! A record is immutable once hashed. Any change to a field yields a
//! different digest, which is what the ledger anchor detects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::canonical_pretty;
use crate::crypto::{hash_record, Digest};
use crate::error::{Result, ValidationError};
use crate::timestamp::duration_between;
use crate::types::RecordId;

/// The current record schema version.
pub const SCHEMA_VERSION: &str = "0.1";

/// Placeholder for identifying strings the caller did not supply.
pub const UNKNOWN: &str = "Unknown";

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// Identifying metadata for the experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default = "unknown")]
    pub model_name: String,
    #[serde(default = "unknown")]
    pub dataset_name: String,
}

impl Default for Experiment {
    fn default() -> Self {
        Self {
            name: unknown(),
            model_name: unknown(),
            dataset_name: unknown(),
        }
    }
}

/// Training parameters. Unset counts serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Training {
    pub epochs: Option<u64>,
    pub batch_size: Option<u64>,
    #[serde(default = "unknown")]
    pub framework: String,
}

impl Default for Training {
    fn default() -> Self {
        Self {
            epochs: None,
            batch_size: None,
            framework: unknown(),
        }
    }
}

/// Description of the machine the run executed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hardware {
    pub cpu_type: String,
    pub gpu_type: String,
    pub num_gpus: u32,
    pub ram_gb: f64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            cpu_type: unknown(),
            gpu_type: "None".to_string(),
            num_gpus: 0,
            ram_gb: 0.0,
        }
    }
}

/// Energy and emissions figures for the measured interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyEmissions {
    pub measurement_tool: String,
    pub energy_kwh: f64,
    pub co2_kg: f64,
    pub duration_seconds: u64,
}

/// Wall-clock bounds of the run, ISO-8601 UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub start_time: String,
    pub end_time: String,
}

/// A complete MRV record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Fixed format identifier, currently [`SCHEMA_VERSION`].
    pub schema_version: String,

    /// Globally unique `MRV-<uuid>` identifier.
    pub id: RecordId,

    pub experiment: Experiment,
    pub training: Training,
    pub hardware: Hardware,
    pub energy_emissions: EnergyEmissions,
    pub timestamps: Timestamps,
}

impl Record {
    /// Convert to a JSON value.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parse from a JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Compute the canonical digest. Recomputed on every call.
    pub fn digest(&self) -> Result<Digest> {
        hash_record(self)
    }

    /// Render as indented, key-sorted JSON (the on-disk form).
    pub fn to_pretty_json(&self) -> Result<String> {
        canonical_pretty(&self.to_value()?)
    }

    /// Check the record's semantic invariants.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        crate::validation::validate_record(self)
    }
}

/// Builder for assembling records.
///
/// The duration is always derived from the two timestamps, never supplied.
pub struct RecordBuilder {
    id: Option<RecordId>,
    experiment: Experiment,
    training: Training,
    hardware: Hardware,
    measurement_tool: String,
    energy_kwh: f64,
    co2_kg: f64,
    start_time: Option<String>,
    end_time: Option<String>,
}

impl RecordBuilder {
    /// Start building a record for the named experiment.
    pub fn new(experiment_name: impl Into<String>) -> Self {
        Self {
            id: None,
            experiment: Experiment {
                name: experiment_name.into(),
                ..Experiment::default()
            },
            training: Training::default(),
            hardware: Hardware::default(),
            measurement_tool: unknown(),
            energy_kwh: 0.0,
            co2_kg: 0.0,
            start_time: None,
            end_time: None,
        }
    }

    /// Use a specific id instead of generating one.
    pub fn id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.experiment.model_name = name.into();
        self
    }

    pub fn dataset_name(mut self, name: impl Into<String>) -> Self {
        self.experiment.dataset_name = name.into();
        self
    }

    pub fn epochs(mut self, epochs: Option<u64>) -> Self {
        self.training.epochs = epochs;
        self
    }

    pub fn batch_size(mut self, batch_size: Option<u64>) -> Self {
        self.training.batch_size = batch_size;
        self
    }

    pub fn framework(mut self, framework: impl Into<String>) -> Self {
        self.training.framework = framework.into();
        self
    }

    pub fn hardware(mut self, hardware: Hardware) -> Self {
        self.hardware = hardware;
        self
    }

    pub fn measurement_tool(mut self, tool: impl Into<String>) -> Self {
        self.measurement_tool = tool.into();
        self
    }

    pub fn energy_kwh(mut self, kwh: f64) -> Self {
        self.energy_kwh = kwh;
        self
    }

    pub fn co2_kg(mut self, kg: f64) -> Self {
        self.co2_kg = kg;
        self
    }

    /// Set the run's start and end timestamps (ISO-8601).
    pub fn timestamps(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_time = Some(start.into());
        self.end_time = Some(end.into());
        self
    }

    /// Assemble the record, deriving `duration_seconds` from the timestamps.
    pub fn build(self) -> Result<Record> {
        let start_time = self
            .start_time
            .ok_or(ValidationError::MissingField("timestamps.start_time"))?;
        let end_time = self
            .end_time
            .ok_or(ValidationError::MissingField("timestamps.end_time"))?;
        let duration_seconds = duration_between(&start_time, &end_time)?;

        Ok(Record {
            schema_version: SCHEMA_VERSION.to_string(),
            id: self.id.unwrap_or_else(RecordId::generate),
            experiment: self.experiment,
            training: self.training,
            hardware: self.hardware,
            energy_emissions: EnergyEmissions {
                measurement_tool: self.measurement_tool,
                energy_kwh: self.energy_kwh,
                co2_kg: self.co2_kg,
                duration_seconds,
            },
            timestamps: Timestamps {
                start_time,
                end_time,
            },
        })
    }
}
