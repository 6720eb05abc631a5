use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, trace};

use poolsync_api::PoolId;

use crate::error::CoreError;
use crate::model::{Settings, default_capabilities};
use crate::ports::DeviceSink;

/// Availability as last set by a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Unknown,
    Available,
    Unavailable { reason: String },
}

/// Point-in-time copy of a [`MemoryDevice`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub pool: PoolId,
    pub name: String,
    pub availability: Availability,
    /// Every declared capability; `None` until a value was written.
    pub capabilities: BTreeMap<String, Option<f64>>,
    pub settings: Settings,
}

/// A device that keeps its capability values and settings in memory.
///
/// Writing to a capability the device does not declare is rejected, the
/// same way a host registry would.
#[derive(Debug)]
pub struct MemoryDevice {
    pool: PoolId,
    name: String,
    capabilities: BTreeSet<String>,
    values: DashMap<String, f64>,
    settings: DashMap<String, String>,
    availability: watch::Sender<Availability>,
}

impl MemoryDevice {
    pub fn new<I, S>(pool: PoolId, name: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (availability, _) = watch::channel(Availability::Unknown);
        Self {
            pool,
            name: name.into(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            values: DashMap::new(),
            settings: DashMap::new(),
            availability,
        }
    }

    /// A device declaring one capability per known measurement type.
    pub fn with_default_capabilities(pool: PoolId, name: impl Into<String>) -> Self {
        Self::new(pool, name, default_capabilities())
    }

    /// Seed settings, e.g. the values chosen at pairing time.
    pub fn with_settings(self, settings: Settings) -> Self {
        for (key, value) in settings {
            self.settings.insert(key, value);
        }
        self
    }

    pub fn pool(&self) -> &PoolId {
        &self.pool
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability_value(&self, capability: &str) -> Option<f64> {
        self.values.get(capability).map(|v| *v)
    }

    pub fn setting(&self, key: &str) -> Option<String> {
        self.settings.get(key).map(|v| v.clone())
    }

    pub fn availability(&self) -> Availability {
        self.availability.borrow().clone()
    }

    /// Watch availability changes.
    pub fn subscribe(&self) -> watch::Receiver<Availability> {
        self.availability.subscribe()
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            pool: self.pool.clone(),
            name: self.name.clone(),
            availability: self.availability(),
            capabilities: self
                .capabilities
                .iter()
                .map(|c| (c.clone(), self.capability_value(c)))
                .collect(),
            settings: self
                .settings
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl DeviceSink for MemoryDevice {
    async fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    async fn set_capability_value(&self, capability: &str, value: f64) -> Result<(), CoreError> {
        if !self.capabilities.contains(capability) {
            return Err(CoreError::Sink {
                operation: format!("set {capability}"),
                message: "capability not declared".into(),
            });
        }
        trace!(pool = %self.pool, capability, value, "capability value");
        self.values.insert(capability.to_owned(), value);
        Ok(())
    }

    async fn set_settings(&self, settings: &Settings) -> Result<(), CoreError> {
        for (key, value) in settings {
            self.settings.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn set_available(&self) -> Result<(), CoreError> {
        self.availability.send_replace(Availability::Available);
        Ok(())
    }

    async fn set_unavailable(&self, reason: &str) -> Result<(), CoreError> {
        debug!(pool = %self.pool, reason, "device unavailable");
        self.availability.send_replace(Availability::Unavailable {
            reason: reason.to_owned(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_undeclared_capabilities() {
        let device = MemoryDevice::new(PoolId::from("1"), "Pool", ["measure_ph"]);

        device.set_capability_value("measure_ph", 7.1).await.unwrap();
        assert!(device.set_capability_value("measure_salt", 1.0).await.is_err());

        assert_eq!(device.capability_value("measure_ph"), Some(7.1));
        assert_eq!(device.capability_value("measure_salt"), None);
    }

    #[tokio::test]
    async fn settings_merge_and_snapshot() {
        let mut seed = Settings::new();
        seed.insert("volume".into(), "40 m³".into());
        let device = MemoryDevice::with_default_capabilities(PoolId::from("1"), "Pool").with_settings(seed);

        let mut update = Settings::new();
        update.insert("sw_version".into(), "1.5".into());
        device.set_settings(&update).await.unwrap();
        device.set_unavailable("offline").await.unwrap();

        let snap = device.snapshot();
        assert_eq!(snap.settings.len(), 2);
        assert_eq!(snap.capabilities.len(), 7);
        assert!(snap.capabilities.values().all(Option::is_none));
        assert_eq!(
            snap.availability,
            Availability::Unavailable {
                reason: "offline".into()
            }
        );
    }
}
