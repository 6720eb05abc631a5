// Scripted API fake shared by the unit tests.
#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use poolsync_api::{
    DeviceMetadata, Measurement, PoolId, PoolSummary, Recommendation, RecommendationStatus,
};

use crate::ports::PoolApi;

/// Canned response for one endpoint.
#[derive(Debug, Clone)]
pub(crate) enum Reply<T> {
    Ok(T),
    /// Non-2xx with an empty body.
    Status(u16),
    /// 2xx with a body that is not a JSON document.
    Invalid,
}

impl<T: Clone> Reply<T> {
    fn resolve(&self) -> Result<T, poolsync_api::Error> {
        match self {
            Self::Ok(v) => Ok(v.clone()),
            Self::Status(status) => Err(poolsync_api::Error::from_status(*status, "")),
            Self::Invalid => Err(poolsync_api::Error::invalid_response(200, "<html>")),
        }
    }
}

pub(crate) struct MockApi {
    pools: Mutex<Reply<Vec<PoolSummary>>>,
    device: Mutex<Reply<DeviceMetadata>>,
    measurements: Mutex<Reply<Vec<Measurement>>>,
    recommendations: Mutex<Reply<Vec<Recommendation>>>,
    delay: Mutex<Duration>,
    device_calls: AtomicUsize,
    recommendation_calls: AtomicUsize,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            pools: Mutex::new(Reply::Ok(Vec::new())),
            device: Mutex::new(Reply::Ok(DeviceMetadata::default())),
            measurements: Mutex::new(Reply::Ok(Vec::new())),
            recommendations: Mutex::new(Reply::Ok(Vec::new())),
            delay: Mutex::new(Duration::ZERO),
            device_calls: AtomicUsize::new(0),
            recommendation_calls: AtomicUsize::new(0),
        }
    }
}

impl MockApi {
    pub(crate) fn set_pools(&self, reply: Reply<Vec<PoolSummary>>) {
        *self.pools.lock().unwrap() = reply;
    }

    pub(crate) fn set_device(&self, reply: Reply<DeviceMetadata>) {
        *self.device.lock().unwrap() = reply;
    }

    pub(crate) fn set_measurements(&self, reply: Reply<Vec<Measurement>>) {
        *self.measurements.lock().unwrap() = reply;
    }

    pub(crate) fn set_recommendations(&self, reply: Reply<Vec<Recommendation>>) {
        *self.recommendations.lock().unwrap() = reply;
    }

    /// Delay every fetch, to keep a cycle in flight.
    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Number of cycles that reached the API.
    pub(crate) fn device_calls(&self) -> usize {
        self.device_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn recommendation_calls(&self) -> usize {
        self.recommendation_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PoolApi for MockApi {
    async fn discover_pools(&self) -> Result<Vec<PoolSummary>, poolsync_api::Error> {
        let reply = self.pools.lock().unwrap().clone();
        reply.resolve()
    }

    async fn fetch_device(&self, _: &PoolId) -> Result<DeviceMetadata, poolsync_api::Error> {
        self.device_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let reply = self.device.lock().unwrap().clone();
        reply.resolve()
    }

    async fn fetch_measurements(&self, _: &PoolId) -> Result<Vec<Measurement>, poolsync_api::Error> {
        self.pause().await;
        let reply = self.measurements.lock().unwrap().clone();
        reply.resolve()
    }

    async fn fetch_recommendations(
        &self,
        _: &PoolId,
    ) -> Result<Vec<Recommendation>, poolsync_api::Error> {
        self.recommendation_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let reply = self.recommendations.lock().unwrap().clone();
        reply.resolve()
    }
}

pub(crate) fn measurement(data_type: &str, value: f64) -> Measurement {
    Measurement {
        data_type: data_type.to_owned(),
        value,
        value_time: Some("2024-06-01 08:15:42".to_owned()),
        is_valid: Some(true),
        exclusion_reason: None,
    }
}

pub(crate) fn waiting(id: &str, title: &str) -> Recommendation {
    Recommendation {
        id: id.to_owned(),
        title: title.to_owned(),
        message: "m".to_owned(),
        status: RecommendationStatus::Waiting,
        created_at: None,
        deadline: None,
    }
}

pub(crate) fn summary(id: &str, name: &str, volume: Option<f64>) -> PoolSummary {
    PoolSummary {
        id: PoolId::from(id),
        name: name.to_owned(),
        volume,
        extra: serde_json::Map::new(),
    }
}
