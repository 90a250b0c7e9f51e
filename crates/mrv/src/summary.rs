//! Human-readable end-of-run summary.

use std::fmt;

use mrv_core::{Record, RecordId};
use mrv_ledger::TxHash;

const RULE: &str = "============================================================";

/// Render whole seconds as `1h 30m 45s`, omitting zero units.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{}s", secs));
    }
    parts.join(" ")
}

/// What a finished session reports.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub experiment: String,
    pub model: String,
    pub dataset: String,
    pub duration_seconds: u64,
    pub energy_kwh: f64,
    pub co2_kg: f64,
    pub mrv_id: RecordId,
    pub tx_hash: Option<TxHash>,
}

impl SessionSummary {
    pub fn new(record: &Record, tx_hash: Option<TxHash>) -> Self {
        Self {
            experiment: record.experiment.name.clone(),
            model: record.experiment.model_name.clone(),
            dataset: record.experiment.dataset_name.clone(),
            duration_seconds: record.energy_emissions.duration_seconds,
            energy_kwh: record.energy_emissions.energy_kwh,
            co2_kg: record.energy_emissions.co2_kg,
            mrv_id: record.id.clone(),
            tx_hash,
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(f, "MRV TRACKING SUMMARY")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Experiment:     {}", self.experiment)?;
        writeln!(f, "Model:          {}", self.model)?;
        writeln!(f, "Dataset:        {}", self.dataset)?;
        writeln!(f, "Duration:       {}", format_duration(self.duration_seconds))?;
        writeln!(f, "Energy:         {:.6} kWh", self.energy_kwh)?;
        writeln!(f, "CO2:            {:.6} kg", self.co2_kg)?;
        writeln!(f)?;
        writeln!(f, "MRV ID:         {}", self.mrv_id)?;
        if let Some(tx) = &self.tx_hash {
            writeln!(f, "Blockchain TX:  {}", tx.short())?;
        }
        write!(f, "{}", RULE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrv_core::RecordBuilder;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(60), "1m");
        assert_eq!(format_duration(3600), "1h");
        assert_eq!(format_duration(3661), "1h 1m 1s");
        assert_eq!(format_duration(5445), "1h 30m 45s");
        assert_eq!(format_duration(7200 + 5), "2h 5s");
    }

    #[test]
    fn test_summary_display() {
        let record = RecordBuilder::new("bert-finetune")
            .model_name("BERT")
            .dataset_name("SST-2")
            .energy_kwh(0.0125)
            .timestamps("2024-01-01T00:00:00+00:00", "2024-01-01T01:30:45+00:00")
            .build()
            .unwrap();

        let text = SessionSummary::new(&record, Some(TxHash([0xab; 32]))).to_string();
        assert!(text.contains("Experiment:     bert-finetune"));
        assert!(text.contains("Duration:       1h 30m 45s"));
        assert!(text.contains("Energy:         0.012500 kWh"));
        assert!(text.contains("CO2:            0.000000 kg"));
        assert!(text.contains(&format!("MRV ID:         {}", record.id)));
        assert!(text.contains("Blockchain TX:  0xabababab...ababab"));
    }

    #[test]
    fn test_summary_without_tx() {
        let record = RecordBuilder::new("x")
            .timestamps("2024-01-01T00:00:00+00:00", "2024-01-01T00:00:00+00:00")
            .build()
            .unwrap();
        let text = SessionSummary::new(&record, None).to_string();
        assert!(!text.contains("Blockchain TX"));
        assert!(text.contains("Duration:       0s"));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn parse(text: &str) -> u64 {
            text.split(' ')
                .map(|part| {
                    let (n, unit) = part.split_at(part.len() - 1);
                    let n: u64 = n.parse().unwrap();
                    match unit {
                        "h" => n * 3600,
                        "m" => n * 60,
                        _ => n,
                    }
                })
                .sum()
        }

        proptest! {
            #[test]
            fn duration_text_adds_up(seconds in 0u64..10_000_000) {
                prop_assert_eq!(parse(&format_duration(seconds)), seconds);
            }
        }
    }
}
