//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a scratch storage directory, an
//! in-process ledger node, and deterministic stand-ins for the measurement,
//! hardware and registry collaborators.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::RngCore;
use tempfile::TempDir;

use mrv::{
    MeasurementSource, RegistrySink, SessionConfig, SessionError, StaticProbe, TrackingSession,
    Verifier,
};
use mrv_core::{Hardware, Record, RecordBuilder, RecordId};
use mrv_ledger::{LedgerClient, MemoryChain};
use mrv_store::FileStore;

/// Well-known development key. Its address is funded on every local chain
/// and must never hold real value.
pub const DEV_PRIVATE_KEY: &str =
    "0x8da4ef21b864d2cc526dbdb2a120bd2874c36c9d0a1fb7f8c63d7f7a8b41de8f";

/// A fresh random secp256k1 private key as `0x`-prefixed hex.
pub fn random_private_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("0x{}", hex::encode(bytes))
}

/// A fully populated record with fixed content.
pub fn sample_record(id: &str) -> Record {
    RecordBuilder::new("resnet-cifar10")
        .id(RecordId::parse(id).expect("fixture id must be valid"))
        .model_name("ResNet-18")
        .dataset_name("CIFAR-10")
        .epochs(Some(10))
        .batch_size(Some(128))
        .framework("PyTorch")
        .hardware(sample_hardware())
        .measurement_tool("mrv-cpu-power-model")
        .energy_kwh(0.123457)
        .co2_kg(0.049383)
        .timestamps("2024-01-01T00:00:00+00:00", "2024-01-01T01:00:00+00:00")
        .build()
        .expect("fixture record must build")
}

pub fn sample_hardware() -> Hardware {
    Hardware {
        cpu_type: "Intel(R) Xeon(R) CPU".to_string(),
        gpu_type: "None".to_string(),
        num_gpus: 0,
        ram_gb: 62.79,
    }
}

/// Measurement source that reports a preset energy figure.
///
/// Clones share their call counters.
#[derive(Debug, Clone)]
pub struct ScriptedMeter {
    kwh: Option<f64>,
    fail_start: bool,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl ScriptedMeter {
    /// Report `kwh` on every stop.
    pub fn new(kwh: f64) -> Self {
        Self {
            kwh: Some(kwh),
            fail_start: false,
            starts: Arc::default(),
            stops: Arc::default(),
        }
    }

    /// Report no measurement at all.
    pub fn silent() -> Self {
        Self {
            kwh: None,
            ..Self::new(0.0)
        }
    }

    /// Refuse to start.
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::new(0.0)
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl MeasurementSource for ScriptedMeter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn start(&mut self, _interval: Duration) -> mrv::Result<()> {
        if self.fail_start {
            return Err(SessionError::Measurement("scripted start failure".into()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Option<f64> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.kwh
    }
}

/// Registry sink that keeps uploaded records in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingRegistry {
    uploads: Arc<Mutex<Vec<Record>>>,
    fail: bool,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that rejects every upload.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Records received so far.
    pub fn uploads(&self) -> Vec<Record> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl RegistrySink for RecordingRegistry {
    fn upload(&self, record: &Record) -> mrv::Result<()> {
        if self.fail {
            return Err(SessionError::Registry("registry returned 500".into()));
        }
        self.uploads
            .lock()
            .map_err(|_| SessionError::Registry("upload log poisoned".into()))?
            .push(record.clone());
        Ok(())
    }
}

/// A scratch storage directory plus an in-process ledger node.
///
/// The directory is removed when the fixture drops.
pub struct TestFixture {
    dir: TempDir,
    pub chain: Arc<MemoryChain>,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_chain(MemoryChain::new())
    }

    /// Use a preconfigured node (chain id, receipt delay).
    pub fn with_chain(chain: MemoryChain) -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
            chain: Arc::new(chain),
        }
    }

    /// The record storage directory.
    pub fn storage_dir(&self) -> PathBuf {
        self.dir.path().join("mrv_data")
    }

    /// Scratch space outside the storage directory.
    pub fn scratch(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self) -> FileStore {
        FileStore::open(self.storage_dir()).expect("failed to open store")
    }

    /// Ledger client signing with [`DEV_PRIVATE_KEY`].
    pub fn ledger(&self) -> LedgerClient<Arc<MemoryChain>> {
        self.ledger_with_key(DEV_PRIVATE_KEY)
    }

    /// Ledger client signing with `key`.
    pub fn ledger_with_key(&self, key: &str) -> LedgerClient<Arc<MemoryChain>> {
        let config = self
            .chain
            .client_config()
            .with_private_key(key)
            .with_poll_interval(Duration::from_millis(1))
            .with_receipt_timeout(Duration::from_secs(2));
        LedgerClient::new(Arc::clone(&self.chain), config).expect("fixture ledger config")
    }

    /// Read-only ledger client (no key).
    pub fn reader(&self) -> LedgerClient<Arc<MemoryChain>> {
        LedgerClient::new(Arc::clone(&self.chain), self.chain.client_config())
            .expect("fixture ledger config")
    }

    pub fn verifier(&self) -> Verifier<Arc<MemoryChain>> {
        Verifier::new(self.reader())
    }

    /// Session config writing into this fixture's storage directory.
    pub fn config(&self, experiment: &str) -> SessionConfig {
        SessionConfig::new(experiment)
            .with_storage_dir(self.storage_dir())
            .with_measure_interval(Duration::from_millis(10))
            .with_ledger(self.chain.client_config().with_private_key(DEV_PRIVATE_KEY))
    }

    /// Session over this fixture's store and ledger with a scripted meter
    /// and fixed hardware.
    pub fn session(
        &self,
        config: SessionConfig,
        meter: ScriptedMeter,
    ) -> TrackingSession<FileStore, Arc<MemoryChain>> {
        let ledger = config.blockchain_enabled.then(|| self.ledger());
        TrackingSession::with_store(config, self.store(), ledger)
            .with_meter(meter)
            .with_probe(StaticProbe(sample_hardware()))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixtures sharing one ledger node, each with its own storage directory
/// and signing key.
pub fn multi_submitter_fixtures(count: usize) -> Vec<(TestFixture, String)> {
    let chain = Arc::new(MemoryChain::new());
    (0..count)
        .map(|_| {
            let fixture = TestFixture {
                dir: TempDir::new().expect("failed to create temp dir"),
                chain: Arc::clone(&chain),
            };
            (fixture, random_private_key())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrv_store::RecordStore;

    #[test]
    fn test_sample_record_is_valid() {
        let r = sample_record("MRV-fixture");
        r.validate().unwrap();
        assert_eq!(r.energy_emissions.duration_seconds, 3600);
    }

    #[test]
    fn test_fixture_store_roundtrip() {
        let fx = TestFixture::new();
        let store = fx.store();
        let r = sample_record("MRV-fixture");
        store.save(&r, None).unwrap();
        assert_eq!(store.load(&r.id).unwrap(), Some(r));
        assert!(fx.storage_dir().is_dir());
    }

    #[test]
    fn test_ledger_fixture_anchors() {
        let fx = TestFixture::new();
        let ledger = fx.ledger();
        let digest = sample_record("MRV-fixture").digest().unwrap();
        assert!(ledger.anchor("MRV-fixture", &digest).is_some());
        assert!(fx.reader().verify("MRV-fixture", &digest));
    }

    #[test]
    fn test_scripted_meter_counts_calls() {
        let meter = ScriptedMeter::new(1.5);
        let mut handle = meter.clone();
        handle.start(Duration::from_millis(1)).unwrap();
        assert_eq!(handle.stop(), Some(1.5));
        assert_eq!(meter.starts(), 1);
        assert_eq!(meter.stops(), 1);

        assert!(ScriptedMeter::failing().start(Duration::ZERO).is_err());
        assert_eq!(ScriptedMeter::silent().stop(), None);
    }

    #[test]
    fn test_multi_submitter_fixtures_share_chain() {
        let fixtures = multi_submitter_fixtures(2);
        let (a, key_a) = &fixtures[0];
        let (b, key_b) = &fixtures[1];
        assert!(Arc::ptr_eq(&a.chain, &b.chain));
        assert_ne!(key_a, key_b);
        assert_ne!(a.storage_dir(), b.storage_dir());
    }
}
