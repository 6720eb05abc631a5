//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use poolsync_config::ConfigError;
use poolsync_core::{CoreError, ErrorKind};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Ondilo API: {message}")]
    #[diagnostic(
        code(poolsync::connection_failed),
        help(
            "Check your internet connection and the configured api_url.\n\
             Increase the request timeout with --timeout if the service is slow."
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(poolsync::auth_failed),
        help(
            "The access token was rejected or has expired.\n\
             Obtain a fresh token and pass it with --token or POOLSYNC_TOKEN."
        )
    )]
    AuthFailed { message: String },

    #[error("No access token configured")]
    #[diagnostic(
        code(poolsync::no_token),
        help(
            "Pass --token, set POOLSYNC_TOKEN, or configure access_token_env in\n\
             {path}\n\
             Create a starter file with: poolsync config init"
        )
    )]
    NoToken { path: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(poolsync::not_found),
        help("Run: poolsync {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({kind}): {message}")]
    #[diagnostic(code(poolsync::api_error))]
    ApiError { kind: String, message: String },

    // ── Engine ───────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(poolsync::engine))]
    Engine { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(poolsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(poolsync::config), help("Check the config file syntax and POOLSYNC_* variables."))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(poolsync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoToken { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api { kind, message, .. } => match kind {
                ErrorKind::Unauthorized => CliError::AuthFailed { message },
                ErrorKind::NetworkError => CliError::ConnectionFailed { message },
                ErrorKind::NotFound => CliError::NotFound {
                    resource_type: "pool".into(),
                    identifier: message,
                    list_command: "pools".into(),
                },
                other => CliError::ApiError {
                    kind: other.to_string(),
                    message,
                },
            },

            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "pool".into(),
                identifier,
                list_command: "pools".into(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Io(e) => CliError::Io(e),
            CoreError::Json(e) => CliError::Json(e),

            other @ (CoreError::Sink { .. }
            | CoreError::Notification { .. }
            | CoreError::State { .. }) => CliError::Engine {
                message: other.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoToken => CliError::NoToken {
                path: poolsync_config::config_path().display().to_string(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
            ConfigError::Serialization(e) => CliError::Engine {
                message: format!("failed to serialize config: {e}"),
            },
        }
    }
}

impl From<poolsync_api::Error> for CliError {
    fn from(err: poolsync_api::Error) -> Self {
        CoreError::from(err).into()
    }
}
