//! Tracking session: the `Created -> Running -> Stopped` state machine
//! wrapped around one training run.
//!
//! `stop()` measures, builds and persists the record; those steps must
//! succeed and their errors propagate. Registry upload and ledger anchoring
//! follow as best-effort steps whose failures are only logged.

use tracing::{error, info, warn};

use mrv_core::{clamp_end, now_iso, Digest, Record, RecordBuilder, RecordId};
use mrv_ledger::{HttpTransport, LedgerClient, RpcTransport, TxHash};
use mrv_store::{FileStore, RecordStore};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::hardware::{HardwareProbe, SystemProbe};
use crate::measurement::{round6, CpuPowerMeter, MeasurementSource};
use crate::registry::{HttpRegistry, RegistrySink};
use crate::summary::SessionSummary;

/// Lifecycle of a session. There is no way back from `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Running,
    Stopped,
}

/// Tracks one training run and produces its MRV record.
pub struct TrackingSession<S: RecordStore = FileStore, T: RpcTransport = HttpTransport> {
    config: SessionConfig,
    store: S,
    ledger: Option<LedgerClient<T>>,
    meter: Box<dyn MeasurementSource>,
    probe: Box<dyn HardwareProbe>,
    registry: Option<Box<dyn RegistrySink>>,
    state: SessionState,
    start_time: Option<String>,
    mrv_id: Option<RecordId>,
    pending: Option<Record>,
    record: Option<Record>,
    tx_hash: Option<TxHash>,
    summary: Option<SessionSummary>,
}

impl TrackingSession<FileStore, HttpTransport> {
    /// Session with the default collaborators: a file store at
    /// `config.storage_dir`, the CPU power meter, the system hardware
    /// probe, an HTTP registry if `registry_url` is set, and an HTTP ledger
    /// client if blockchain support is enabled.
    ///
    /// A malformed ledger or registry setting disables that collaborator
    /// with a warning instead of failing.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let store = FileStore::open(&config.storage_dir)?;

        let ledger = if config.blockchain_enabled {
            match LedgerClient::http(config.ledger.clone()) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "ledger disabled: invalid configuration");
                    None
                }
            }
        } else {
            None
        };

        let registry: Option<Box<dyn RegistrySink>> = match config.registry_url.as_deref() {
            Some(url) => match HttpRegistry::new(url) {
                Ok(registry) => Some(Box::new(registry)),
                Err(e) => {
                    warn!(error = %e, "registry upload disabled");
                    None
                }
            },
            None => None,
        };

        let mut session = Self::with_store(config, store, ledger);
        session.registry = registry;
        Ok(session)
    }
}

impl<S: RecordStore, T: RpcTransport> TrackingSession<S, T> {
    /// Session over an explicit store and optional ledger client. Uses the
    /// CPU power meter and system probe until replaced.
    pub fn with_store(config: SessionConfig, store: S, ledger: Option<LedgerClient<T>>) -> Self {
        Self {
            config,
            store,
            ledger,
            meter: Box::new(CpuPowerMeter::new()),
            probe: Box::new(SystemProbe::new()),
            registry: None,
            state: SessionState::Created,
            start_time: None,
            mrv_id: None,
            pending: None,
            record: None,
            tx_hash: None,
            summary: None,
        }
    }

    pub fn with_meter(mut self, meter: impl MeasurementSource + 'static) -> Self {
        self.meter = Box::new(meter);
        self
    }

    pub fn with_probe(mut self, probe: impl HardwareProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn with_registry(mut self, registry: impl RegistrySink + 'static) -> Self {
        self.registry = Some(Box::new(registry));
        self
    }

    /// Begin measuring. Only valid in the `Created` state.
    pub fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Created {
            return Err(SessionError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }

        info!(experiment = %self.config.experiment_name, "starting MRV tracking");
        let start_time = now_iso();
        self.meter.start(self.config.measure_interval)?;
        self.start_time = Some(start_time);
        self.state = SessionState::Running;
        Ok(())
    }

    /// Finish the run: measure, build and save the record, then upload and
    /// anchor it if configured.
    ///
    /// Calling this before `start()` or once stopped logs a warning and
    /// does nothing. If saving fails the session stays `Running` and keeps
    /// the built record, so calling `stop()` again retries the save without
    /// measuring twice.
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            SessionState::Created => {
                warn!("tracker not started, nothing to stop");
                return Ok(());
            }
            SessionState::Stopped => {
                warn!("tracker already stopped");
                return Ok(());
            }
            SessionState::Running => {}
        }

        let record = match self.pending.take() {
            Some(record) => {
                info!(mrv_id = %record.id, "retrying record save");
                record
            }
            None => {
                info!(experiment = %self.config.experiment_name, "stopping MRV tracking");
                let energy_kwh = self
                    .meter
                    .stop()
                    .filter(|kwh| kwh.is_finite() && *kwh > 0.0)
                    .map(round6)
                    .unwrap_or(0.0);
                let end_time = now_iso();
                let start_time = self.start_time.clone().unwrap_or_else(|| end_time.clone());
                match self.build_record(energy_kwh, start_time, end_time) {
                    Ok(record) => record,
                    Err(e) => {
                        self.state = SessionState::Stopped;
                        return Err(e);
                    }
                }
            }
        };

        let mrv_id = match self.store.save(&record, None) {
            Ok(id) => id,
            Err(e) => {
                warn!(mrv_id = %record.id, error = %e, "failed to save record, stop() may be retried");
                self.pending = Some(record);
                return Err(e.into());
            }
        };
        self.state = SessionState::Stopped;
        self.mrv_id = Some(mrv_id.clone());

        if let Some(registry) = &self.registry {
            if let Err(e) = registry.upload(&record) {
                warn!(mrv_id = %mrv_id, error = %e, "failed to save to registry");
            }
        }

        self.record = Some(record);
        if self.config.blockchain_enabled && self.config.auto_anchor {
            self.tx_hash = self.anchor();
        }

        if let Some(record) = &self.record {
            let summary = SessionSummary::new(record, self.tx_hash);
            info!("\n{}", summary);
            self.summary = Some(summary);
        }
        Ok(())
    }

    /// Assemble and validate the record. An `end_time` before `start_time`
    /// is pulled up to `start_time`.
    fn build_record(&self, energy_kwh: f64, start_time: String, end_time: String) -> Result<Record> {
        let config = &self.config;
        let end_time = clamp_end(&start_time, &end_time)?;
        let record = RecordBuilder::new(config.experiment_name.clone())
            .id(self.store.generate_id())
            .model_name(config.model_name.clone())
            .dataset_name(config.dataset_name.clone())
            .epochs(config.epochs)
            .batch_size(config.batch_size)
            .framework(config.framework.clone())
            .hardware(self.probe.probe())
            .measurement_tool(self.meter.name())
            .energy_kwh(energy_kwh)
            .co2_kg(config.co2_for(energy_kwh))
            .timestamps(start_time, end_time)
            .build()?;
        record.validate()?;
        Ok(record)
    }

    /// Anchor the current record's digest. `None` without a ledger, before
    /// a record exists, or when anchoring fails.
    ///
    /// `stop()` calls this itself when `auto_anchor` is set.
    pub fn anchor(&self) -> Option<TxHash> {
        let ledger = self.ledger.as_ref()?;
        let (Some(id), Some(digest)) = (self.mrv_id.as_ref(), self.get_hash()) else {
            return None;
        };
        ledger.anchor(id.as_str(), &digest)
    }

    /// Stop on every exit path: the returned guard stops the session when
    /// finished or dropped.
    pub fn begin(&mut self) -> Result<SessionGuard<'_, S, T>> {
        self.start()?;
        Ok(SessionGuard {
            session: self,
            finished: false,
        })
    }

    /// Run `workload` between `start()` and `stop()`.
    ///
    /// If the workload panics the session is still stopped (and the record
    /// saved) while unwinding.
    pub fn track<F, R>(&mut self, workload: F) -> Result<R>
    where
        F: FnOnce() -> R,
    {
        let guard = self.begin()?;
        let output = workload();
        guard.finish()?;
        Ok(output)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> Option<&LedgerClient<T>> {
        self.ledger.as_ref()
    }

    /// Id of the saved record; set once `stop()` has persisted it.
    pub fn mrv_id(&self) -> Option<&RecordId> {
        self.mrv_id.as_ref()
    }

    /// The generated record.
    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// Anchoring transaction, if anchoring succeeded.
    pub fn tx_hash(&self) -> Option<TxHash> {
        self.tx_hash
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Digest of the current record, recomputed on every call.
    pub fn get_hash(&self) -> Option<Digest> {
        let record = self.record.as_ref()?;
        match record.digest() {
            Ok(digest) => Some(digest),
            Err(e) => {
                error!(error = %e, "failed to hash record");
                None
            }
        }
    }

    /// Whether the ledger holds this record's current digest.
    pub fn verify_on_blockchain(&self) -> bool {
        let (Some(ledger), Some(id), Some(digest)) =
            (self.ledger.as_ref(), self.mrv_id.as_ref(), self.get_hash())
        else {
            return false;
        };
        ledger.verify(id.as_str(), &digest)
    }
}

impl<S: RecordStore, T: RpcTransport> std::fmt::Debug for TrackingSession<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingSession")
            .field("experiment", &self.config.experiment_name)
            .field("state", &self.state)
            .field("mrv_id", &self.mrv_id)
            .field("tx_hash", &self.tx_hash)
            .finish_non_exhaustive()
    }
}

/// Scope guard returned by [`TrackingSession::begin`].
///
/// Dropping the guard stops the session; [`finish`](Self::finish) does the
/// same but reports errors.
pub struct SessionGuard<'a, S: RecordStore, T: RpcTransport> {
    session: &'a mut TrackingSession<S, T>,
    finished: bool,
}

impl<'a, S: RecordStore, T: RpcTransport> SessionGuard<'a, S, T> {
    pub fn session(&self) -> &TrackingSession<S, T> {
        self.session
    }

    /// Stop the session now and return the outcome.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.session.stop()
    }
}

impl<'a, S: RecordStore, T: RpcTransport> Drop for SessionGuard<'a, S, T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.session.stop() {
            error!(error = %e, "failed to stop tracking session");
        }
    }
}
