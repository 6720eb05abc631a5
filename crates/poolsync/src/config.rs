//! CLI-side configuration: wraps `poolsync-config` with `GlobalOpts`
//! overrides (config path, API URL, token, timeout).

use std::path::PathBuf;

use secrecy::SecretString;

use poolsync_config::{Config, ConfigError};
use poolsync_core::ApiConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config` / `POOLSYNC_CONFIG`, else the platform path.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(poolsync_config::config_path)
}

/// Load config from file + env, then apply flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = poolsync_config::load_config_from(&config_path(global))?;

    if let Some(ref url) = global.api_url {
        cfg.api_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the access token: `--token` / `POOLSYNC_TOKEN` first, then the
/// config chain.
pub fn resolve_token(global: &GlobalOpts, cfg: &Config) -> Result<SecretString, CliError> {
    if let Some(token) = global.token.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(SecretString::from(token.to_owned()));
    }
    poolsync_config::resolve_access_token(cfg).map_err(|e| match e {
        ConfigError::NoToken => CliError::NoToken {
            path: config_path(global).display().to_string(),
        },
        other => other.into(),
    })
}

/// API settings with every override applied.
pub fn api_config(global: &GlobalOpts, cfg: &Config) -> Result<ApiConfig, CliError> {
    let token = resolve_token(global, cfg)?;
    Ok(cfg.api_config_with_token(token)?)
}
