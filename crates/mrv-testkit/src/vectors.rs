//! Golden test vectors for deterministic verification.
//!
//! Each vector pins the canonical text of a JSON document and its SHA-256
//! digest. Anchors written by any other encoder of the same format must
//! reproduce these bytes exactly, so a change here breaks every existing
//! anchor.

use serde_json::Value;

use mrv_core::{canonical_string, hash_value, Digest};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Input document, as JSON text in any layout.
    pub input: &'static str,
    /// Expected canonical compact encoding.
    pub canonical: &'static str,
    /// Expected digest (hex).
    pub digest: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "complete record",
            input: r#"{
                "schema_version": "0.1",
                "id": "MRV-00000000-0000-4000-8000-000000000001",
                "experiment": {"name": "resnet-cifar10", "model_name": "ResNet-18", "dataset_name": "CIFAR-10"},
                "training": {"epochs": 10, "batch_size": 128, "framework": "PyTorch"},
                "hardware": {"cpu_type": "Intel(R) Xeon(R) CPU", "gpu_type": "None", "num_gpus": 0, "ram_gb": 62.79},
                "energy_emissions": {"measurement_tool": "mrv-cpu-power-model", "energy_kwh": 0.123457, "co2_kg": 0.049383, "duration_seconds": 3600},
                "timestamps": {"start_time": "2024-01-01T00:00:00+00:00", "end_time": "2024-01-01T01:00:00+00:00"}
            }"#,
            canonical: r#"{"energy_emissions":{"co2_kg":0.049383,"duration_seconds":3600,"energy_kwh":0.123457,"measurement_tool":"mrv-cpu-power-model"},"experiment":{"dataset_name":"CIFAR-10","model_name":"ResNet-18","name":"resnet-cifar10"},"hardware":{"cpu_type":"Intel(R) Xeon(R) CPU","gpu_type":"None","num_gpus":0,"ram_gb":62.79},"id":"MRV-00000000-0000-4000-8000-000000000001","schema_version":"0.1","timestamps":{"end_time":"2024-01-01T01:00:00+00:00","start_time":"2024-01-01T00:00:00+00:00"},"training":{"batch_size":128,"epochs":10,"framework":"PyTorch"}}"#,
            digest: "5fd6e48271733c76c820cbf0788299ad44f56e889a4e71837f5b728fef9f157d",
        },
        GoldenVector {
            name: "all defaults",
            input: r#"{
                "schema_version": "0.1",
                "id": "MRV-minimal",
                "experiment": {"name": "Unknown", "model_name": "Unknown", "dataset_name": "Unknown"},
                "training": {"epochs": null, "batch_size": null, "framework": "Unknown"},
                "hardware": {"cpu_type": "Unknown", "gpu_type": "None", "num_gpus": 0, "ram_gb": 0.0},
                "energy_emissions": {"measurement_tool": "None", "energy_kwh": 0.0, "co2_kg": 0.0, "duration_seconds": 0},
                "timestamps": {"start_time": "2024-01-01T00:00:00+00:00", "end_time": "2024-01-01T00:00:00+00:00"}
            }"#,
            canonical: r#"{"energy_emissions":{"co2_kg":0.0,"duration_seconds":0,"energy_kwh":0.0,"measurement_tool":"None"},"experiment":{"dataset_name":"Unknown","model_name":"Unknown","name":"Unknown"},"hardware":{"cpu_type":"Unknown","gpu_type":"None","num_gpus":0,"ram_gb":0.0},"id":"MRV-minimal","schema_version":"0.1","timestamps":{"end_time":"2024-01-01T00:00:00+00:00","start_time":"2024-01-01T00:00:00+00:00"},"training":{"batch_size":null,"epochs":null,"framework":"Unknown"}}"#,
            digest: "f46f93b5b926eb064be6eb67b73c02baf0867d73d2bdb894209c5e3a03b63364",
        },
        GoldenVector {
            name: "float forms and non-ASCII text",
            input: r#"{"b": 1, "a": [1.5, 1e-5, 1e16, null, true], "é": "ü☃"}"#,
            canonical: r#"{"a":[1.5,1e-05,1e+16,null,true],"b":1,"\u00e9":"\u00fc\u2603"}"#,
            digest: "b003d2b91f31c1e8f72b22cbe8c5fb6a688cd63ebe6629f03dca3466c8e2df99",
        },
        GoldenVector {
            name: "empty object",
            input: "{}",
            canonical: "{}",
            digest: "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a",
        },
    ]
}

/// Canonical text and digest produced by this build for a vector.
pub fn compute(vector: &GoldenVector) -> (String, Digest) {
    let value: Value = serde_json::from_str(vector.input).expect("vector input must parse");
    let canonical = canonical_string(&value).expect("vector input must encode");
    let digest = hash_value(&value).expect("vector input must hash");
    (canonical, digest)
}

/// Check every golden vector against this build.
///
/// Returns `(name, matches, computed digest hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let (canonical, digest) = compute(v);
            let hex = digest.to_hex();
            let matches = canonical == v.canonical && hex == v.digest;
            (v.name.to_string(), matches, hex)
        })
        .collect()
}
