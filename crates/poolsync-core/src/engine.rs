// ── Device lifecycle engine ──
//
// Glue between the host's device lifecycle and the per-device machinery:
// adding a device creates its coordinator, makes sure a recommendation
// store exists, starts its timer and runs the first cycle; removing it
// stops the timer and deletes the store.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use poolsync_api::PoolId;

use crate::config::SyncConfig;
use crate::coordinator::{DeviceSyncCoordinator, SyncContext};
use crate::error::CoreError;
use crate::model::{SyncOutcome, SyncStatus};
use crate::pairing::{PairingCandidate, pairing_candidates};
use crate::ports::DeviceSink;
use crate::recommendations::RecommendationStore;
use crate::scheduler::PollScheduler;

/// Lifecycle events a host delivers for its devices.
#[async_trait]
pub trait DeviceLifecycle: Send + Sync {
    /// A device was paired, or re-initialized after a host restart.
    ///
    /// Returns the outcome of the initial cycle. Adding a pool that is
    /// already managed is a no-op reported as [`SyncOutcome::Skipped`].
    async fn on_add(&self, pool: PoolId, sink: Arc<dyn DeviceSink>) -> Result<SyncOutcome, CoreError>;

    /// A device was deleted. Unknown pools are ignored.
    async fn on_remove(&self, pool: &PoolId) -> Result<(), CoreError>;

    /// The host is going away.
    async fn shutdown(&self);
}

/// Manages every paired pool of one account.
pub struct SyncEngine {
    context: SyncContext,
    config: SyncConfig,
    scheduler: PollScheduler,
}

impl SyncEngine {
    pub fn new(context: SyncContext, config: SyncConfig) -> Self {
        Self {
            context,
            config,
            scheduler: PollScheduler::new(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// Pools of the account, ready to pair.
    pub async fn discover(&self) -> Result<Vec<PairingCandidate>, CoreError> {
        let pools = self.context.api.discover_pools().await?;
        debug!(count = pools.len(), "pools discovered");
        Ok(pairing_candidates(&pools))
    }

    /// Force a cycle for a managed pool.
    pub async fn sync_now(&self, pool: &PoolId) -> Result<SyncOutcome, CoreError> {
        self.scheduler
            .sync_now(pool)
            .await
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: pool.to_string(),
            })
    }

    /// Force a cycle for every managed pool.
    pub async fn sync_all(&self) -> Vec<(PoolId, SyncOutcome)> {
        self.scheduler.sync_all().await
    }

    pub async fn status(&self, pool: &PoolId) -> Option<SyncStatus> {
        self.scheduler.coordinator(pool).await.map(|c| c.status())
    }
}

#[async_trait]
impl DeviceLifecycle for SyncEngine {
    async fn on_add(&self, pool: PoolId, sink: Arc<dyn DeviceSink>) -> Result<SyncOutcome, CoreError> {
        if self.scheduler.is_running(&pool).await {
            debug!(pool = %pool, "device already managed");
            return Ok(SyncOutcome::Skipped);
        }

        if self.context.state.load(&pool).await?.is_none() {
            self.context.state.save(&pool, &RecommendationStore::new()).await?;
        }

        let coordinator = Arc::new(DeviceSyncCoordinator::new(
            pool.clone(),
            self.context.clone(),
            sink,
            &self.config,
        ));
        // Another add for the same pool may have won while the store was
        // being prepared.
        if !self
            .scheduler
            .start(Arc::clone(&coordinator), self.config.poll_interval)
            .await
        {
            debug!(pool = %pool, "device already managed");
            return Ok(SyncOutcome::Skipped);
        }
        info!(pool = %pool, "device added");

        Ok(coordinator.sync().await)
    }

    async fn on_remove(&self, pool: &PoolId) -> Result<(), CoreError> {
        // The store must outlive every cycle, including the initial one
        // and forced ones, or a late save would bring it back.
        if let Some(coordinator) = self.scheduler.remove(pool).await {
            coordinator.retire().await;
        }
        self.context.state.remove(pool).await?;
        info!(pool = %pool, "device removed");
        Ok(())
    }

    async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}
