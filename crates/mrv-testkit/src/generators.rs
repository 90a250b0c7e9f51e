//! Proptest generators for property-based testing.

use chrono::{DateTime, SecondsFormat};
use proptest::prelude::*;
use serde_json::{Map, Number, Value};

use mrv_core::{Hardware, Record, RecordBuilder, RecordId};

/// Generate a record id with a short random suffix.
pub fn record_id() -> impl Strategy<Value = RecordId> {
    "MRV-[a-z0-9]{1,8}(-[a-z0-9]{1,8}){0,4}"
        .prop_map(|s| RecordId::parse(&s).expect("pattern yields valid ids"))
}

/// Generate a free-text name, including non-ASCII characters.
pub fn name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _\\-.éü☃]{1,24}".prop_map(String::from)
}

/// Generate a non-negative figure at full `f64` precision.
pub fn figure() -> impl Strategy<Value = f64> {
    prop_oneof![
        0.0f64..1.0e6,
        (0u64..1_000_000_000_000).prop_map(|micro| micro as f64 / 1e6),
    ]
}

/// Generate a start time and an end time at or after it.
pub fn timestamps() -> impl Strategy<Value = (String, String)> {
    (0i64..1_000_000_000, 0i64..1_000_000).prop_map(|(start, elapsed)| {
        (format_utc(1_600_000_000 + start), format_utc(1_600_000_000 + start + elapsed))
    })
}

fn format_utc(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Generate hardware descriptions.
pub fn hardware() -> impl Strategy<Value = Hardware> {
    (name(), prop::option::of(name()), 0u32..8, figure()).prop_map(
        |(cpu_type, gpu, num_gpus, ram_gb)| Hardware {
            cpu_type,
            gpu_type: gpu.unwrap_or_else(|| "None".to_string()),
            num_gpus,
            ram_gb,
        },
    )
}

/// Parameters for generating a record.
#[derive(Debug, Clone)]
pub struct RecordParams {
    pub id: RecordId,
    pub experiment_name: String,
    pub model_name: String,
    pub epochs: Option<u64>,
    pub batch_size: Option<u64>,
    pub hardware: Hardware,
    pub energy_kwh: f64,
    pub co2_kg: f64,
    pub timestamps: (String, String),
}

impl Arbitrary for RecordParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            record_id(),
            name(),
            name(),
            prop::option::of(0u64..10_000),
            prop::option::of(1u64..4096),
            hardware(),
            figure(),
            figure(),
            timestamps(),
        )
            .prop_map(
                |(id, experiment_name, model_name, epochs, batch_size, hardware, kwh, co2, ts)| {
                    RecordParams {
                        id,
                        experiment_name,
                        model_name,
                        epochs,
                        batch_size,
                        hardware,
                        energy_kwh: kwh,
                        co2_kg: co2,
                        timestamps: ts,
                    }
                },
            )
            .boxed()
    }
}

/// Build a record from parameters.
pub fn record_from_params(params: &RecordParams) -> Record {
    RecordBuilder::new(params.experiment_name.clone())
        .id(params.id.clone())
        .model_name(params.model_name.clone())
        .epochs(params.epochs)
        .batch_size(params.batch_size)
        .hardware(params.hardware.clone())
        .measurement_tool("scripted")
        .energy_kwh(params.energy_kwh)
        .co2_kg(params.co2_kg)
        .timestamps(params.timestamps.0.clone(), params.timestamps.1.clone())
        .build()
        .expect("generated params always build")
}

/// Generate arbitrary JSON documents with finite numbers.
pub fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|i| Value::Number(i.into())),
        figure().prop_map(|f| Number::from_f64(f).map_or(Value::Null, Value::Number)),
        name().prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((name(), inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrv_core::{canonical_pretty, canonical_string, hash_value};

    proptest! {
        #[test]
        fn test_record_digest_deterministic(params: RecordParams) {
            let r1 = record_from_params(&params);
            let r2 = record_from_params(&params);
            prop_assert_eq!(r1.digest().unwrap(), r2.digest().unwrap());
        }

        #[test]
        fn test_generated_records_validate(params: RecordParams) {
            prop_assert!(record_from_params(&params).validate().is_ok());
        }

        #[test]
        fn test_canonical_form_is_ascii(value in json_value()) {
            prop_assert!(canonical_string(&value).unwrap().is_ascii());
        }

        #[test]
        fn test_digest_ignores_layout(value in json_value()) {
            let pretty = canonical_pretty(&value).unwrap();
            let reparsed: Value = serde_json::from_str(&pretty).unwrap();
            prop_assert_eq!(hash_value(&reparsed).unwrap(), hash_value(&value).unwrap());
        }

        #[test]
        fn test_digest_changes_with_energy(params: RecordParams, delta in 1u64..1_000_000) {
            let original = record_from_params(&params);
            let mut edited = original.clone();
            edited.energy_emissions.energy_kwh += delta as f64 / 1e6;
            prop_assume!(edited.energy_emissions.energy_kwh != original.energy_emissions.energy_kwh);
            prop_assert_ne!(original.digest().unwrap(), edited.digest().unwrap());
        }

        #[test]
        fn test_digest_changes_with_name(params: RecordParams, other in name()) {
            prop_assume!(other != params.experiment_name);
            let original = record_from_params(&params);
            let mut edited = original.clone();
            edited.experiment.name = other;
            prop_assert_ne!(original.digest().unwrap(), edited.digest().unwrap());
        }

        #[test]
        fn test_record_digest_survives_pretty_reparse(params: RecordParams) {
            let record = record_from_params(&params);
            let text = record.to_pretty_json().unwrap();
            let reparsed: Record = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(&reparsed, &record);
            prop_assert_eq!(reparsed.digest().unwrap(), record.digest().unwrap());
        }
    }

    #[test]
    fn test_format_utc() {
        assert_eq!(format_utc(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(format_utc(1_704_067_200), "2024-01-01T00:00:00+00:00");
        assert_eq!(format_utc(951_825_600), "2000-02-29T12:00:00+00:00");
    }
}
