use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use poolsync_api::PoolId;

use crate::error::CoreError;
use crate::ports::StateStore;
use crate::recommendations::RecommendationStore;

/// Recommendation stores kept for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    stores: DashMap<PoolId, RecommendationStore>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, pool: &PoolId) -> Result<Option<RecommendationStore>, CoreError> {
        Ok(self.stores.get(pool).map(|s| s.clone()))
    }

    async fn save(&self, pool: &PoolId, store: &RecommendationStore) -> Result<(), CoreError> {
        self.stores.insert(pool.clone(), store.clone());
        Ok(())
    }

    async fn remove(&self, pool: &PoolId) -> Result<(), CoreError> {
        self.stores.remove(pool);
        Ok(())
    }
}

type StoreFile = BTreeMap<String, RecommendationStore>;

/// Recommendation stores of every pool in one JSON document.
///
/// The document is read once on open and rewritten in full on every change
/// (temp file + rename).
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    stores: Mutex<StoreFile>,
}

impl FileStateStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let stores = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => StoreFile::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| CoreError::State {
                message: format!("{}: {e}", path.display()),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreFile::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), pools = stores.len(), "recommendation store opened");
        Ok(Self {
            path,
            stores: Mutex::new(stores),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, stores: &StoreFile) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(stores)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, pool: &PoolId) -> Result<Option<RecommendationStore>, CoreError> {
        Ok(self.stores.lock().await.get(pool.as_str()).cloned())
    }

    async fn save(&self, pool: &PoolId, store: &RecommendationStore) -> Result<(), CoreError> {
        let mut stores = self.stores.lock().await;
        stores.insert(pool.as_str().to_owned(), store.clone());
        self.persist(&stores).await
    }

    async fn remove(&self, pool: &PoolId) -> Result<(), CoreError> {
        let mut stores = self.stores.lock().await;
        if stores.remove(pool.as_str()).is_some() {
            self.persist(&stores).await?;
        }
        Ok(())
    }
}
