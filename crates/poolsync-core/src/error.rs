// ── Core error types ──
//
// Errors raised by the engine itself: port failures, persistence and
// lifecycle misuse. API failures are normally consumed by the coordinator
// and turned into an availability reason; the `From<poolsync_api::Error>`
// impl covers the few paths (discovery, client construction) where they
// propagate.

use thiserror::Error;

use poolsync_api::ErrorKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("{message}")]
    Api {
        kind: ErrorKind,
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Port errors ──────────────────────────────────────────────────
    #[error("Device rejected {operation}: {message}")]
    Sink { operation: String, message: String },

    #[error("Notification delivery failed: {message}")]
    Notification { message: String },

    #[error("Recommendation store error: {message}")]
    State { message: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Pool not managed: {identifier}")]
    DeviceNotFound { identifier: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// The API failure category, when this error came from the API.
    pub fn api_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<poolsync_api::Error> for CoreError {
    fn from(err: poolsync_api::Error) -> Self {
        match err {
            poolsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid API URL: {e}"),
            },
            poolsync_api::Error::Client(message) => CoreError::Config { message },
            other => CoreError::Api {
                kind: other.kind(),
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}
