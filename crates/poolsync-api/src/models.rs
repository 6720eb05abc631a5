// Ondilo customer API response types
//
// Fields use `#[serde(default)]` liberally: the vendor omits optional data
// rather than sending nulls, and older firmware reports fewer fields.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ── Identifiers ──────────────────────────────────────────────────────

/// Identifier shapes the vendor uses: integers today, strings tolerated.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(n) => n.to_string(),
            RawId::Str(s) => s,
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

/// Vendor-assigned pool identifier, stable for the lifetime of the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolId(#[serde(deserialize_with = "string_or_number")] String);

impl PoolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PoolId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for PoolId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for PoolId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

// ── Discovery ────────────────────────────────────────────────────────

/// Pool entry from `GET /pools`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSummary {
    pub id: PoolId,
    #[serde(default)]
    pub name: String,
    /// Water volume in cubic meters.
    #[serde(default)]
    pub volume: Option<f64>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Device ───────────────────────────────────────────────────────────

/// Hardware information from `GET /pools/{id}/device`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub sw_version: Option<String>,
    #[serde(default)]
    pub volume: Option<f64>,
}

// ── Measurements ─────────────────────────────────────────────────────

/// Measurement types requested on every `lastmeasures` call.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MeasureType {
    Temperature,
    Ph,
    Orp,
    Salt,
    Tds,
    Battery,
    Rssi,
}

impl MeasureType {
    /// The exact `types[]` set the API expects.
    pub const ALL: [MeasureType; 7] = [
        MeasureType::Temperature,
        MeasureType::Ph,
        MeasureType::Orp,
        MeasureType::Salt,
        MeasureType::Tds,
        MeasureType::Battery,
        MeasureType::Rssi,
    ];

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// One entry from `GET /pools/{id}/lastmeasures`.
///
/// `data_type` stays a string so new vendor types still deserialize;
/// use [`Measurement::measure_type`] for the known ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub data_type: String,
    pub value: f64,
    /// `YYYY-MM-DD HH:MM:SS`, UTC.
    #[serde(default)]
    pub value_time: Option<String>,
    #[serde(default)]
    pub is_valid: Option<bool>,
    #[serde(default)]
    pub exclusion_reason: Option<String>,
}

impl Measurement {
    pub fn measure_type(&self) -> Option<MeasureType> {
        MeasureType::from_str(&self.data_type).ok()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.value_time.as_deref()?;
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .map(|naive| naive.and_utc())
            .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
            .ok()
    }
}

// ── Recommendations ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    /// Not yet acted upon by the owner.
    Waiting,
    #[default]
    #[serde(other)]
    Other,
}

/// One entry from `GET /pools/{id}/recommendations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: RecommendationStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
}

impl Recommendation {
    pub fn is_active(&self) -> bool {
        self.status == RecommendationStatus::Waiting
    }

    /// Text shown to the user: `"{title}: {message}"`.
    pub fn display_text(&self) -> String {
        format!("{}: {}", self.title, self.message)
    }
}
