// ── Poll scheduler ──
//
// One background task per device, firing the device's coordinator on a
// fixed interval. Every task hangs off a child of the scheduler's root
// cancellation token, so a device can be stopped alone and `shutdown`
// stops them all. Cancellation is only observed between cycles.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use poolsync_api::PoolId;

use crate::coordinator::DeviceSyncCoordinator;
use crate::model::SyncOutcome;

/// Shortest interval a timer accepts.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

struct ScheduledPoll {
    coordinator: Arc<DeviceSyncCoordinator>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the poll timers of every managed device.
pub struct PollScheduler {
    polls: Mutex<HashMap<PoolId, ScheduledPoll>>,
    cancel: CancellationToken,
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PollScheduler {
    pub fn new() -> Self {
        Self {
            polls: Mutex::new(HashMap::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Start polling the coordinator's pool every `interval`.
    ///
    /// The first scheduled cycle runs one interval from now. Returns `false`
    /// when the pool already has a timer or the scheduler was shut down.
    pub async fn start(&self, coordinator: Arc<DeviceSyncCoordinator>, interval: Duration) -> bool {
        let pool = coordinator.pool().clone();
        let mut polls = self.polls.lock().await;

        if self.cancel.is_cancelled() {
            warn!(pool = %pool, "scheduler is shut down, not starting timer");
            return false;
        }
        if polls.contains_key(&pool) {
            debug!(pool = %pool, "timer already running");
            return false;
        }

        let interval = interval.max(MIN_INTERVAL);
        let cancel = self.cancel.child_token();
        let handle = tokio::spawn(poll_task(Arc::clone(&coordinator), interval, cancel.clone()));
        polls.insert(
            pool.clone(),
            ScheduledPoll {
                coordinator,
                cancel,
                handle,
            },
        );
        info!(pool = %pool, interval_secs = interval.as_secs(), "poll timer started");
        true
    }

    /// Stop polling `pool`. A scheduled cycle already running finishes first.
    ///
    /// Returns `false` when no timer was registered.
    pub async fn stop(&self, pool: &PoolId) -> bool {
        self.remove(pool).await.is_some()
    }

    /// Stop polling `pool` and hand back its coordinator.
    ///
    /// Only the timer task is awaited. Cycles started elsewhere, through
    /// [`sync_now`](Self::sync_now) or by the caller, may still be running;
    /// use [`DeviceSyncCoordinator::retire`] to wait for those.
    pub async fn remove(&self, pool: &PoolId) -> Option<Arc<DeviceSyncCoordinator>> {
        let poll = self.polls.lock().await.remove(pool)?;
        poll.cancel.cancel();
        if let Err(e) = poll.handle.await {
            warn!(pool = %pool, error = %e, "poll task ended abnormally");
        }
        info!(pool = %pool, "poll timer stopped");
        Some(poll.coordinator)
    }

    /// Stop every timer and wait for the tasks to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let polls: Vec<_> = self.polls.lock().await.drain().collect();
        for (pool, poll) in polls {
            if let Err(e) = poll.handle.await {
                warn!(pool = %pool, error = %e, "poll task ended abnormally");
            }
        }
        debug!("scheduler shut down");
    }

    pub async fn is_running(&self, pool: &PoolId) -> bool {
        self.polls.lock().await.contains_key(pool)
    }

    pub async fn active_count(&self) -> usize {
        self.polls.lock().await.len()
    }

    /// Scheduled pools, sorted.
    pub async fn pools(&self) -> Vec<PoolId> {
        let mut pools: Vec<_> = self.polls.lock().await.keys().cloned().collect();
        pools.sort();
        pools
    }

    pub async fn coordinator(&self, pool: &PoolId) -> Option<Arc<DeviceSyncCoordinator>> {
        self.polls
            .lock()
            .await
            .get(pool)
            .map(|p| Arc::clone(&p.coordinator))
    }

    /// Run a cycle for `pool` right away, outside the timer.
    ///
    /// `None` when the pool is not scheduled.
    pub async fn sync_now(&self, pool: &PoolId) -> Option<SyncOutcome> {
        let coordinator = self.coordinator(pool).await?;
        Some(coordinator.sync().await)
    }

    /// Run a cycle for every scheduled pool concurrently.
    pub async fn sync_all(&self) -> Vec<(PoolId, SyncOutcome)> {
        let coordinators: Vec<_> = self
            .polls
            .lock()
            .await
            .values()
            .map(|p| Arc::clone(&p.coordinator))
            .collect();

        let mut results = join_all(coordinators.iter().map(|c| async move {
            (c.pool().clone(), c.sync().await)
        }))
        .await;
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }
}

async fn poll_task(coordinator: Arc<DeviceSyncCoordinator>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let outcome = coordinator.sync().await;
                debug!(pool = %coordinator.pool(), available = outcome.is_available(), "scheduled cycle done");
            }
        }
    }
    debug!(pool = %coordinator.pool(), "poll task exited");
}
