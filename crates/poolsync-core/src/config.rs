// ── Runtime sync configuration ──
//
// These types describe *where* the API lives and *how often* devices are
// polled. They carry the access token but never touch disk: the binary
// builds a `SyncConfig` (usually through `poolsync-config`) and hands it in.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use poolsync_api::{PoolClient, StaticToken, TokenSource, TransportConfig};

use crate::error::CoreError;

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Connection settings for the vendor API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root, e.g. `https://interop.ondilo.com/api/customer/v1`.
    pub url: Url,
    /// Bearer token handed out by the OAuth session.
    pub access_token: SecretString,
    /// Request timeout.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Build a [`PoolClient`] that authenticates with the static token.
    pub fn build_client(&self) -> Result<PoolClient, CoreError> {
        let session: Arc<dyn TokenSource> = Arc::new(StaticToken::from(self.access_token.clone()));
        let transport = TransportConfig::default().with_timeout(self.timeout);
        Ok(PoolClient::new(self.url.clone(), session, &transport)?)
    }
}

/// Per-device polling behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Time between scheduled cycles.
    pub poll_interval: Duration,
    /// Fetch recommendations on every cycle. When off the store is never
    /// touched and no notifications fire.
    pub fetch_recommendations: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_recommendations: true,
        }
    }
}
