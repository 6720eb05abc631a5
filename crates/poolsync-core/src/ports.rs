// ── Collaborator interfaces ──
//
// The engine talks to the vendor API, the host's device registry, its
// notification system and its persistent storage only through these traits.
// Adapters for local use live in `adapters`.

use async_trait::async_trait;
use serde::Serialize;

use poolsync_api::{DeviceMetadata, Measurement, PoolClient, PoolId, PoolSummary, Recommendation};

use crate::error::CoreError;
use crate::model::Settings;
use crate::recommendations::RecommendationStore;

/// Read access to the vendor API.
///
/// Implemented by [`PoolClient`]; tests substitute scripted fakes.
#[async_trait]
pub trait PoolApi: Send + Sync {
    async fn discover_pools(&self) -> Result<Vec<PoolSummary>, poolsync_api::Error>;

    async fn fetch_device(&self, id: &PoolId) -> Result<DeviceMetadata, poolsync_api::Error>;

    async fn fetch_measurements(&self, id: &PoolId) -> Result<Vec<Measurement>, poolsync_api::Error>;

    async fn fetch_recommendations(
        &self,
        id: &PoolId,
    ) -> Result<Vec<Recommendation>, poolsync_api::Error>;
}

#[async_trait]
impl PoolApi for PoolClient {
    async fn discover_pools(&self) -> Result<Vec<PoolSummary>, poolsync_api::Error> {
        PoolClient::discover_pools(self).await
    }

    async fn fetch_device(&self, id: &PoolId) -> Result<DeviceMetadata, poolsync_api::Error> {
        PoolClient::fetch_device(self, id).await
    }

    async fn fetch_measurements(&self, id: &PoolId) -> Result<Vec<Measurement>, poolsync_api::Error> {
        PoolClient::fetch_measurements(self, id).await
    }

    async fn fetch_recommendations(
        &self,
        id: &PoolId,
    ) -> Result<Vec<Recommendation>, poolsync_api::Error> {
        PoolClient::fetch_recommendations(self, id).await
    }
}

/// The host-side representation of one paired device.
#[async_trait]
pub trait DeviceSink: Send + Sync {
    async fn has_capability(&self, capability: &str) -> bool;

    async fn set_capability_value(&self, capability: &str, value: f64) -> Result<(), CoreError>;

    /// Merge `settings` into the device's settings.
    async fn set_settings(&self, settings: &Settings) -> Result<(), CoreError>;

    async fn set_available(&self) -> Result<(), CoreError>;

    async fn set_unavailable(&self, reason: &str) -> Result<(), CoreError>;
}

/// Payload of the "new recommendation" trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationEvent {
    pub id: String,
    /// `"{title}: {message}"`.
    pub recommendation: String,
}

/// Delivers recommendation notifications to the host.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn trigger(&self, pool: &PoolId, event: &RecommendationEvent) -> Result<(), CoreError>;
}

/// Persistent per-device recommendation store.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// `None` when nothing was ever saved for `pool`.
    async fn load(&self, pool: &PoolId) -> Result<Option<RecommendationStore>, CoreError>;

    async fn save(&self, pool: &PoolId, store: &RecommendationStore) -> Result<(), CoreError>;

    /// Removing an unknown pool is not an error.
    async fn remove(&self, pool: &PoolId) -> Result<(), CoreError>;
}
