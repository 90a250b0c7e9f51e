//! Energy measurement sources.
//!
//! A session owns exactly one [`MeasurementSource`]. Environments without
//! instrumentation use [`NullMeter`]; [`CpuPowerMeter`] estimates energy
//! from CPU utilisation.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use sysinfo::System;
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

/// Joules per kilowatt-hour.
const JOULES_PER_KWH: f64 = 3_600_000.0;

/// Round to 6 decimal places, the precision records carry.
pub fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Something that measures energy use between `start` and `stop`.
pub trait MeasurementSource: Send {
    /// Tool name written into `energy_emissions.measurement_tool`.
    fn name(&self) -> &str;

    /// Begin measuring, sampling every `interval`.
    fn start(&mut self, interval: Duration) -> Result<()>;

    /// Stop measuring and return the energy used in kWh, if known.
    fn stop(&mut self) -> Option<f64>;
}

impl<M: MeasurementSource + ?Sized> MeasurementSource for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn start(&mut self, interval: Duration) -> Result<()> {
        (**self).start(interval)
    }

    fn stop(&mut self) -> Option<f64> {
        (**self).stop()
    }
}

/// No instrumentation: reports no energy.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMeter;

impl MeasurementSource for NullMeter {
    fn name(&self) -> &str {
        "None"
    }

    fn start(&mut self, _interval: Duration) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Option<f64> {
        None
    }
}

/// Default package power for [`CpuPowerMeter`], in watts.
pub const DEFAULT_PACKAGE_WATTS: f64 = 65.0;

struct Sampler {
    stop: Sender<()>,
    handle: JoinHandle<f64>,
}

/// Energy model driven by global CPU utilisation.
///
/// A background thread samples utilisation with `sysinfo` and integrates
/// `utilisation * package_watts` over wall time.
pub struct CpuPowerMeter {
    package_watts: f64,
    sampler: Option<Sampler>,
}

impl CpuPowerMeter {
    pub fn new() -> Self {
        Self::with_package_watts(DEFAULT_PACKAGE_WATTS)
    }

    /// Model a CPU drawing `watts` at full utilisation.
    pub fn with_package_watts(watts: f64) -> Self {
        Self {
            package_watts: watts.max(0.0),
            sampler: None,
        }
    }

    pub fn package_watts(&self) -> f64 {
        self.package_watts
    }

    pub fn is_running(&self) -> bool {
        self.sampler.is_some()
    }
}

impl Default for CpuPowerMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CpuPowerMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuPowerMeter")
            .field("package_watts", &self.package_watts)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Sample until told to stop, returning joules consumed.
fn sample_loop(package_watts: f64, interval: Duration, stop: mpsc::Receiver<()>) -> f64 {
    let mut system = System::new();
    system.refresh_cpu_usage();
    let mut last = Instant::now();
    let mut joules = 0.0;

    let mut accumulate = |system: &mut System, last: &mut Instant| {
        system.refresh_cpu_usage();
        let utilisation = f64::from(system.global_cpu_usage()).clamp(0.0, 100.0) / 100.0;
        let now = Instant::now();
        joules += utilisation * package_watts * now.duration_since(*last).as_secs_f64();
        *last = now;
    };

    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => accumulate(&mut system, &mut last),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                accumulate(&mut system, &mut last);
                break;
            }
        }
    }
    joules
}

impl MeasurementSource for CpuPowerMeter {
    fn name(&self) -> &str {
        "mrv-cpu-power-model"
    }

    fn start(&mut self, interval: Duration) -> Result<()> {
        if self.sampler.is_some() {
            return Err(SessionError::Measurement("meter already running".into()));
        }
        let interval = interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        let watts = self.package_watts;
        let (stop, rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("mrv-cpu-meter".into())
            .spawn(move || sample_loop(watts, interval, rx))
            .map_err(|e| SessionError::Measurement(e.to_string()))?;

        debug!(?interval, package_watts = watts, "cpu power meter started");
        self.sampler = Some(Sampler { stop, handle });
        Ok(())
    }

    fn stop(&mut self) -> Option<f64> {
        let sampler = self.sampler.take()?;
        let _ = sampler.stop.send(());
        match sampler.handle.join() {
            Ok(joules) => Some(joules / JOULES_PER_KWH),
            Err(_) => {
                warn!("cpu power meter thread panicked");
                None
            }
        }
    }
}

impl Drop for CpuPowerMeter {
    fn drop(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            let _ = sampler.stop.send(());
            let _ = sampler.handle.join();
        }
    }
}
