//! Record validation: structural checks on raw JSON and semantic checks on
//! typed records.

use serde_json::Value;

use crate::error::ValidationError;
use crate::record::{Record, SCHEMA_VERSION};
use crate::timestamp::parse_iso;

/// Top-level sections every record document carries.
const REQUIRED_SECTIONS: [&str; 7] = [
    "schema_version",
    "id",
    "experiment",
    "training",
    "hardware",
    "energy_emissions",
    "timestamps",
];

/// Validate the structure of a raw record document.
///
/// This performs:
/// - Top-level section presence
/// - Presence of the experiment name, energy figure and start time
pub fn validate_value(value: &Value) -> Result<(), ValidationError> {
    let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

    for section in REQUIRED_SECTIONS {
        if !obj.contains_key(section) {
            return Err(ValidationError::MissingField(section));
        }
    }

    let nested: [(&str, &str, &'static str); 3] = [
        ("experiment", "name", "experiment.name"),
        ("energy_emissions", "energy_kwh", "energy_emissions.energy_kwh"),
        ("timestamps", "start_time", "timestamps.start_time"),
    ];
    for (section, field, label) in nested {
        if value[section].get(field).is_none() {
            return Err(ValidationError::MissingField(label));
        }
    }

    Ok(())
}

/// Validate a typed record's invariants.
///
/// - Schema version is supported
/// - Numeric figures are finite and non-negative
/// - Both timestamps parse and `end_time >= start_time`
pub fn validate_record(record: &Record) -> Result<(), ValidationError> {
    if record.schema_version != SCHEMA_VERSION {
        return Err(ValidationError::UnsupportedSchema(
            record.schema_version.clone(),
        ));
    }

    let figures = [
        ("hardware.ram_gb", record.hardware.ram_gb),
        ("energy_emissions.energy_kwh", record.energy_emissions.energy_kwh),
        ("energy_emissions.co2_kg", record.energy_emissions.co2_kg),
    ];
    for (field, value) in figures {
        if !value.is_finite() {
            return Err(ValidationError::StructuralError(format!(
                "{} is not a finite number",
                field
            )));
        }
        if value < 0.0 {
            return Err(ValidationError::Negative { field, value });
        }
    }

    let start = parse_iso(&record.timestamps.start_time)
        .map_err(|e| ValidationError::StructuralError(e.to_string()))?;
    let end = parse_iso(&record.timestamps.end_time)
        .map_err(|e| ValidationError::StructuralError(e.to_string()))?;
    if end < start {
        return Err(ValidationError::EndBeforeStart {
            start: record.timestamps.start_time.clone(),
            end: record.timestamps.end_time.clone(),
        });
    }

    Ok(())
}
