//! Shared configuration for poolsync.
//!
//! TOML file + `POOLSYNC_*` environment layering, access-token resolution
//! (env var or plaintext), and translation to `poolsync_core::ApiConfig` /
//! `SyncConfig`. The CLI applies its flag overrides on top.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use poolsync_api::DEFAULT_API_URL;
use poolsync_core::{ApiConfig, SyncConfig};

/// Prefix of every environment override, e.g. `POOLSYNC_API_URL`.
pub const ENV_PREFIX: &str = "POOLSYNC_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no access token configured (set access_token, access_token_env or POOLSYNC_TOKEN)")]
    NoToken,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// API root URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Access token (plaintext, prefer `access_token_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Environment variable name containing the access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_env: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,

    #[serde(default = "default_true")]
    pub fetch_recommendations: bool,

    /// Recommendation store location. Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,

    /// Paired pools managed by `watch`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pools: Vec<PoolEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            access_token: None,
            access_token_env: None,
            timeout: default_timeout(),
            poll_interval_minutes: default_poll_interval(),
            fetch_recommendations: true,
            state_file: None,
            pools: Vec::new(),
        }
    }
}

/// A paired pool.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PoolEntry {
    pub id: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Capabilities the device declares. Defaults to one per measurement type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    15
}
fn default_true() -> bool {
    true
}

impl Config {
    /// Check values that serde alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_url(&self.api_url)?;

        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        if self.poll_interval_minutes == 0 {
            return Err(ConfigError::Validation {
                field: "poll_interval_minutes".into(),
                reason: "must be at least 1 minute".into(),
            });
        }

        let mut seen = HashSet::new();
        for pool in &self.pools {
            if pool.id.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: "pools.id".into(),
                    reason: "must not be empty".into(),
                });
            }
            if !seen.insert(pool.id.as_str()) {
                return Err(ConfigError::Validation {
                    field: "pools.id".into(),
                    reason: format!("duplicate pool '{}'", pool.id),
                });
            }
        }
        Ok(())
    }

    /// Engine settings.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_secs(self.poll_interval_minutes.saturating_mul(60)),
            fetch_recommendations: self.fetch_recommendations,
        }
    }

    /// API settings, with the token resolved from this config.
    pub fn api_config(&self) -> Result<ApiConfig, ConfigError> {
        let token = resolve_access_token(self)?;
        self.api_config_with_token(token)
    }

    /// API settings using an already-resolved token.
    pub fn api_config_with_token(&self, access_token: SecretString) -> Result<ApiConfig, ConfigError> {
        Ok(ApiConfig {
            url: parse_url(&self.api_url)?,
            access_token,
            timeout: Duration::from_secs(self.timeout),
        })
    }

    /// Where the recommendation store lives.
    pub fn state_path(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(default_state_path)
    }
}

fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "poolsync", "poolsync")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn default_state_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("state.json"),
        |dirs| dirs.data_dir().join("state.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("poolsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load and validate config from `path` + environment.
///
/// A missing file is not an error: defaults and environment still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).only(&[
            "api_url",
            "access_token",
            "access_token_env",
            "timeout",
            "poll_interval_minutes",
            "fetch_recommendations",
            "state_file",
        ]));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution (without CLI flags) ────────────────────────────

/// Resolve the access token: `access_token_env` lookup first, then the
/// plaintext `access_token`.
pub fn resolve_access_token(cfg: &Config) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = cfg.access_token_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.trim().is_empty() {
                return Ok(SecretString::from(val));
            }
        }
    }

    if let Some(ref token) = cfg.access_token {
        if !token.trim().is_empty() {
            return Ok(SecretString::from(token.clone()));
        }
    }

    Err(ConfigError::NoToken)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.sync_config(), SyncConfig::default());
        assert!(cfg.pools.is_empty());
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
api_url = "http://localhost:9000/v1"
access_token = "abc"
poll_interval_minutes = 5
fetch_recommendations = false

[[pools]]
id = "1234"
name = "Backyard"

[[pools]]
id = "77"
capabilities = ["measure_temperature"]
"#,
        );

        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg.sync_config().poll_interval, Duration::from_secs(300));
        assert!(!cfg.sync_config().fetch_recommendations);
        assert_eq!(cfg.pools.len(), 2);
        assert_eq!(cfg.pools[0].name.as_deref(), Some("Backyard"));
        assert_eq!(
            cfg.pools[1].capabilities.as_deref(),
            Some(&["measure_temperature".to_owned()][..])
        );

        let api = cfg.api_config().unwrap();
        assert_eq!(api.url.as_str(), "http://localhost:9000/v1");
        assert_eq!(api.access_token.expose_secret(), "abc");
        assert_eq!(api.timeout, Duration::from_secs(30));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();

        for body in [
            "api_url = \"not a url\"",
            "poll_interval_minutes = 0",
            "timeout = 0",
            "[[pools]]\nid = \"1\"\n[[pools]]\nid = \"1\"",
        ] {
            let path = write(&dir, body);
            let err = load_config_from(&path).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { .. }), "{body}: {err}");
        }
    }

    #[test]
    fn token_resolution_order() {
        let mut cfg = Config::default();
        assert!(matches!(resolve_access_token(&cfg), Err(ConfigError::NoToken)));

        cfg.access_token = Some("plain".into());
        cfg.access_token_env = Some("POOLSYNC_TEST_SURELY_UNSET_VARIABLE".into());
        assert_eq!(resolve_access_token(&cfg).unwrap().expose_secret(), "plain");

        cfg.access_token = Some("   ".into());
        assert!(matches!(resolve_access_token(&cfg), Err(ConfigError::NoToken)));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let cfg = Config {
            access_token_env: Some("ONDILO_TOKEN".into()),
            pools: vec![PoolEntry {
                id: "1".into(),
                name: Some("Spa".into()),
                capabilities: None,
            }],
            ..Config::default()
        };

        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn explicit_state_file_wins() {
        let cfg = Config {
            state_file: Some(PathBuf::from("/tmp/poolsync-state.json")),
            ..Config::default()
        };
        assert_eq!(cfg.state_path(), PathBuf::from("/tmp/poolsync-state.json"));
        assert!(Config::default().state_path().ends_with("state.json"));
    }
}
