//! Shared command helpers: engine construction and pool target resolution.

use std::sync::Arc;

use poolsync_config::{Config, PoolEntry};
use poolsync_core::adapters::{FileStateStore, MemoryDevice, MemoryStateStore};
use poolsync_core::model::default_capabilities;
use poolsync_core::{
    Notifier, PairingCandidate, PoolId, Settings, StateStore, SyncConfig, SyncContext, SyncEngine,
};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

/// A pool to run cycles for, with the device it is projected onto.
#[derive(Debug, Clone)]
pub struct Target {
    pub pool: PoolId,
    pub name: String,
    pub capabilities: Vec<String>,
    pub settings: Settings,
}

impl Target {
    fn bare(id: &str) -> Self {
        Self {
            pool: PoolId::from(id),
            name: id.to_owned(),
            capabilities: default_capabilities(),
            settings: Settings::new(),
        }
    }

    pub fn device(&self) -> Arc<MemoryDevice> {
        Arc::new(
            MemoryDevice::new(self.pool.clone(), self.name.clone(), self.capabilities.clone())
                .with_settings(self.settings.clone()),
        )
    }
}

impl From<&PoolEntry> for Target {
    fn from(entry: &PoolEntry) -> Self {
        Self {
            pool: PoolId::from(entry.id.as_str()),
            name: entry.name.clone().unwrap_or_else(|| entry.id.clone()),
            capabilities: entry.capabilities.clone().unwrap_or_else(default_capabilities),
            settings: Settings::new(),
        }
    }
}

impl From<PairingCandidate> for Target {
    fn from(candidate: PairingCandidate) -> Self {
        Self {
            pool: candidate.id,
            name: candidate.name,
            capabilities: default_capabilities(),
            settings: candidate.settings,
        }
    }
}

/// Open the recommendation store configured for this run.
pub async fn open_state(cfg: &Config, in_memory: bool) -> Result<Arc<dyn StateStore>, CliError> {
    if in_memory {
        return Ok(Arc::new(MemoryStateStore::new()));
    }
    let store = FileStateStore::open(cfg.state_path()).await?;
    tracing::debug!(path = %store.path().display(), "using recommendation store");
    Ok(Arc::new(store))
}

/// Build a `SyncEngine` talking to the configured API.
pub fn build_engine(
    global: &GlobalOpts,
    cfg: &Config,
    sync: SyncConfig,
    notifier: Arc<dyn Notifier>,
    state: Arc<dyn StateStore>,
) -> Result<SyncEngine, CliError> {
    let client = config::api_config(global, cfg)?.build_client()?;
    let context = SyncContext {
        api: Arc::new(client),
        notifier,
        state,
    };
    Ok(SyncEngine::new(context, sync))
}

/// Pools to operate on: the one named, else every configured pool, else
/// every pool the account can see.
pub async fn resolve_targets(
    engine: &SyncEngine,
    cfg: &Config,
    only: Option<&str>,
) -> Result<Vec<Target>, CliError> {
    if let Some(id) = only {
        let target = cfg
            .pools
            .iter()
            .find(|p| p.id == id)
            .map_or_else(|| Target::bare(id), Target::from);
        return Ok(vec![target]);
    }

    if !cfg.pools.is_empty() {
        return Ok(cfg.pools.iter().map(Target::from).collect());
    }

    let candidates = engine.discover().await?;
    Ok(candidates.into_iter().map(Target::from).collect())
}
