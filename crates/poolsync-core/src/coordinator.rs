// ── Device sync coordinator ──
//
// One coordinator per paired device. A cycle fetches device metadata,
// measurements and (optionally) recommendations concurrently, then applies
// whatever succeeded: settings, capability values, recommendation
// notifications and availability. API failures become the device's
// unavailable reason; port failures are logged and never fail a cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use poolsync_api::{DeviceMetadata, Measurement, PoolId, Recommendation};

use crate::config::SyncConfig;
use crate::error::CoreError;
use crate::model::{SyncOutcome, SyncReport, SyncSnapshot, SyncStatus, measure_capability, metadata_settings};
use crate::ports::{DeviceSink, Notifier, PoolApi, RecommendationEvent, StateStore};
use crate::recommendations::{self, RecommendationStore};

/// Collaborators shared by every device.
#[derive(Clone)]
pub struct SyncContext {
    pub api: Arc<dyn PoolApi>,
    pub notifier: Arc<dyn Notifier>,
    pub state: Arc<dyn StateStore>,
}

/// Runs sync cycles for a single pool.
///
/// At most one cycle is in flight at a time; a [`sync`](Self::sync) call
/// that arrives while another is running returns [`SyncOutcome::Skipped`]
/// without touching the API.
pub struct DeviceSyncCoordinator {
    pool: PoolId,
    context: SyncContext,
    sink: Arc<dyn DeviceSink>,
    fetch_recommendations: bool,
    status: watch::Sender<SyncStatus>,
    in_flight: Mutex<()>,
    retired: AtomicBool,
}

impl DeviceSyncCoordinator {
    pub fn new(
        pool: PoolId,
        context: SyncContext,
        sink: Arc<dyn DeviceSink>,
        config: &SyncConfig,
    ) -> Self {
        let (status, _) = watch::channel(SyncStatus::Uninitialized);
        Self {
            pool,
            context,
            sink,
            fetch_recommendations: config.fetch_recommendations,
            status,
            in_flight: Mutex::new(()),
            retired: AtomicBool::new(false),
        }
    }

    pub fn pool(&self) -> &PoolId {
        &self.pool
    }

    /// Current status.
    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Whether a cycle is currently running.
    pub fn is_syncing(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Wait for the running cycle, if any, and refuse every later one.
    ///
    /// Once this returns the coordinator no longer touches the API, the
    /// device or the recommendation store.
    pub async fn retire(&self) {
        let _guard = self.in_flight.lock().await;
        self.retired.store(true, Ordering::SeqCst);
        debug!(pool = %self.pool, "coordinator retired");
    }

    /// Run one fetch-and-apply cycle.
    pub async fn sync(&self) -> SyncOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!(pool = %self.pool, "cycle already in flight, skipping");
            return SyncOutcome::Skipped;
        };
        if self.retired.load(Ordering::SeqCst) {
            return SyncOutcome::Skipped;
        }

        self.status.send_replace(SyncStatus::Syncing);
        debug!(pool = %self.pool, "sync cycle started");

        // Loaded before fetching so the diff is against the store as of
        // cycle start. A store that cannot be read disables notifications
        // for this cycle instead of re-announcing everything.
        let previous = if self.fetch_recommendations {
            match self.context.state.load(&self.pool).await {
                Ok(store) => Some(store.unwrap_or_default()),
                Err(e) => {
                    warn!(pool = %self.pool, error = %e, "could not load recommendation store");
                    None
                }
            }
        } else {
            None
        };

        let snapshot = self.fetch().await;
        let outcome = self.apply(snapshot, previous.as_ref()).await;

        match &outcome {
            SyncOutcome::Available { report } => info!(
                pool = %self.pool,
                measurements = report.measurements.len(),
                new_recommendations = report.new_recommendations.len(),
                "sync complete"
            ),
            SyncOutcome::Unavailable { kind, reason, .. } => {
                warn!(pool = %self.pool, %kind, %reason, "sync failed, device unavailable");
            }
            SyncOutcome::Skipped => {}
        }
        outcome
    }

    async fn fetch(&self) -> SyncSnapshot {
        let api = &self.context.api;
        let pool = &self.pool;

        let recommendations = async {
            if self.fetch_recommendations {
                Some(api.fetch_recommendations(pool).await)
            } else {
                None
            }
        };

        let (device, measurements, recommendations) = tokio::join!(
            api.fetch_device(pool),
            api.fetch_measurements(pool),
            recommendations,
        );

        SyncSnapshot {
            device,
            measurements,
            recommendations,
        }
    }

    async fn apply(&self, snapshot: SyncSnapshot, previous: Option<&RecommendationStore>) -> SyncOutcome {
        let SyncSnapshot {
            device,
            measurements,
            recommendations,
        } = snapshot;

        let mut report = SyncReport::default();
        let mut failure = None;

        match device {
            Ok(metadata) => self.apply_metadata(&metadata, &mut report).await,
            Err(e) => {
                warn!(pool = %self.pool, error = %e, "device fetch failed");
                failure = Some(e);
            }
        }

        match measurements {
            Ok(list) => self.apply_measurements(&list, &mut report).await,
            Err(e) => {
                warn!(pool = %self.pool, error = %e, "measurement fetch failed");
                if failure.is_none() {
                    failure = Some(e);
                }
            }
        }

        match recommendations {
            Some(Ok(list)) => {
                if let Some(previous) = previous {
                    self.apply_recommendations(&list, previous, &mut report).await;
                }
            }
            Some(Err(e)) => {
                warn!(pool = %self.pool, error = %e, "recommendation fetch failed, keeping previous store");
            }
            None => {}
        }

        if let Some(err) = failure {
            let reason = err.to_string();
            log_port_error(&self.pool, "set_unavailable", self.sink.set_unavailable(&reason).await);
            self.status.send_replace(SyncStatus::Unavailable {
                reason: reason.clone(),
            });
            return SyncOutcome::Unavailable {
                kind: err.kind(),
                reason,
                report,
            };
        }

        log_port_error(&self.pool, "set_available", self.sink.set_available().await);
        self.status.send_replace(SyncStatus::Available);
        SyncOutcome::Available { report }
    }

    async fn apply_metadata(&self, metadata: &DeviceMetadata, report: &mut SyncReport) {
        let settings = metadata_settings(metadata);
        if settings.is_empty() {
            return;
        }
        log_port_error(&self.pool, "set_settings", self.sink.set_settings(&settings).await);
        report.settings = settings;
    }

    async fn apply_measurements(&self, measurements: &[Measurement], report: &mut SyncReport) {
        for m in measurements {
            let capability = measure_capability(&m.data_type);
            if !self.sink.has_capability(&capability).await {
                debug!(pool = %self.pool, data_type = %m.data_type, "no capability for measurement");
                report.ignored.push(m.data_type.clone());
                continue;
            }
            match self.sink.set_capability_value(&capability, m.value).await {
                Ok(()) => report.measurements.push((capability, m.value)),
                Err(e) => warn!(pool = %self.pool, %capability, error = %e, "capability write failed"),
            }
        }
    }

    async fn apply_recommendations(
        &self,
        current: &[Recommendation],
        previous: &RecommendationStore,
        report: &mut SyncReport,
    ) {
        let diff = recommendations::diff(Some(current), previous);

        for new in &diff.newly_active {
            let event = RecommendationEvent {
                id: new.id.clone(),
                recommendation: new.text.clone(),
            };
            log_port_error(&self.pool, "notify", self.context.notifier.trigger(&self.pool, &event).await);
            report.new_recommendations.push(new.text.clone());
        }

        log_port_error(&self.pool, "save_store", self.context.state.save(&self.pool, &diff.store).await);
        report.recommendations_checked = true;
    }
}

fn log_port_error(pool: &PoolId, operation: &str, result: Result<(), CoreError>) {
    if let Err(e) = result {
        warn!(pool = %pool, operation, error = %e, "port call failed");
    }
}
