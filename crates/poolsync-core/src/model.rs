// ── Host-facing domain types ──
//
// What a cycle produces and what the host sees: capability names, the
// settings map, the per-device status and the outcome of a single cycle.

use std::collections::BTreeMap;

use serde::Serialize;

use poolsync_api::{DeviceMetadata, ErrorKind, MeasureType, Measurement, Recommendation};

/// Device settings written by a cycle, keyed by setting name.
pub type Settings = BTreeMap<String, String>;

pub const SETTING_SERIAL_NUMBER: &str = "serial_number";
pub const SETTING_SW_VERSION: &str = "sw_version";
pub const SETTING_VOLUME: &str = "volume";

/// Capability slot a measurement of `data_type` is written to.
pub fn measure_capability(data_type: &str) -> String {
    format!("measure_{data_type}")
}

/// Capabilities of a freshly paired ICO: one per known measurement type.
pub fn default_capabilities() -> Vec<String> {
    MeasureType::ALL
        .iter()
        .map(|t| measure_capability(t.as_str()))
        .collect()
}

/// Pool volume as shown in device settings.
pub fn format_volume(volume: f64) -> String {
    format!("{volume} m³")
}

/// Settings derived from device metadata. Missing or blank fields are left
/// out so stale values are never overwritten with nothing.
pub fn metadata_settings(metadata: &DeviceMetadata) -> Settings {
    let mut settings = Settings::new();

    let present = |v: &Option<String>| v.as_deref().filter(|s| !s.trim().is_empty()).map(str::to_owned);

    if let Some(serial) = present(&metadata.serial_number) {
        settings.insert(SETTING_SERIAL_NUMBER.to_owned(), serial);
    }
    if let Some(version) = present(&metadata.sw_version) {
        settings.insert(SETTING_SW_VERSION.to_owned(), version);
    }
    if let Some(volume) = metadata.volume {
        settings.insert(SETTING_VOLUME.to_owned(), format_volume(volume));
    }
    settings
}

// ── Sync state ───────────────────────────────────────────────────────

/// Observable per-device status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncStatus {
    /// No cycle has completed yet.
    #[default]
    Uninitialized,
    Syncing,
    Available,
    Unavailable { reason: String },
}

impl SyncStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Raw results of one cycle's fetches, before anything is applied.
///
/// `recommendations` is `None` when the fetch was disabled.
#[derive(Debug)]
pub struct SyncSnapshot {
    pub device: Result<DeviceMetadata, poolsync_api::Error>,
    pub measurements: Result<Vec<Measurement>, poolsync_api::Error>,
    pub recommendations: Option<Result<Vec<Recommendation>, poolsync_api::Error>>,
}

/// What a cycle managed to write.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    /// Settings handed to the device.
    pub settings: Settings,
    /// Capability values written, in measurement order.
    pub measurements: Vec<(String, f64)>,
    /// Measurement types the device has no capability for.
    pub ignored: Vec<String>,
    /// Display texts of the recommendations that fired a notification.
    pub new_recommendations: Vec<String>,
    /// Whether the recommendation store was refreshed this cycle.
    pub recommendations_checked: bool,
}

/// Result of one [`sync`](crate::DeviceSyncCoordinator::sync) call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Available {
        report: SyncReport,
    },
    Unavailable {
        kind: ErrorKind,
        reason: String,
        report: SyncReport,
    },
    /// Another cycle for the same device was already running.
    Skipped,
}

impl SyncOutcome {
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Available { report } | Self::Unavailable { report, .. } => Some(report),
            Self::Skipped => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}
