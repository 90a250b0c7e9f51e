//! Hardware description for records.

use sysinfo::System;

use mrv_core::{Hardware, UNKNOWN};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Describes the machine a run executes on.
pub trait HardwareProbe: Send {
    fn probe(&self) -> Hardware;
}

/// Reads CPU brand and installed RAM from the running system.
///
/// `sysinfo` has no GPU inventory, so GPU fields come from configuration
/// and default to `"None"` / 0.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    gpu_type: String,
    num_gpus: u32,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            gpu_type: "None".to_string(),
            num_gpus: 0,
        }
    }

    /// Report `count` GPUs of the given model.
    pub fn with_gpu(mut self, gpu_type: impl Into<String>, count: u32) -> Self {
        self.gpu_type = gpu_type.into();
        self.num_gpus = count;
        self
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl HardwareProbe for SystemProbe {
    fn probe(&self) -> Hardware {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_all();

        let cpu_type = system
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());

        Hardware {
            cpu_type,
            gpu_type: self.gpu_type.clone(),
            num_gpus: self.num_gpus,
            ram_gb: round2(system.total_memory() as f64 / BYTES_PER_GB),
        }
    }
}

/// Always reports the same hardware.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe(pub Hardware);

impl HardwareProbe for StaticProbe {
    fn probe(&self) -> Hardware {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_probe() {
        let hw = SystemProbe::new().probe();
        assert!(!hw.cpu_type.is_empty());
        assert!(hw.ram_gb >= 0.0);
        assert_eq!(hw.gpu_type, "None");
        assert_eq!(hw.num_gpus, 0);
        assert_eq!(round2(hw.ram_gb), hw.ram_gb);
    }

    #[test]
    fn test_configured_gpu() {
        let hw = SystemProbe::new().with_gpu("NVIDIA A100", 4).probe();
        assert_eq!(hw.gpu_type, "NVIDIA A100");
        assert_eq!(hw.num_gpus, 4);
    }

    #[test]
    fn test_static_probe() {
        let fixed = Hardware {
            cpu_type: "Test CPU".into(),
            gpu_type: "None".into(),
            num_gpus: 0,
            ram_gb: 16.0,
        };
        assert_eq!(StaticProbe(fixed.clone()).probe(), fixed);
    }
}
