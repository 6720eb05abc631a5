use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Category messages used when the vendor does not describe the failure.
pub mod messages {
    pub const UNAUTHORIZED: &str = "Not authorized, please log in to your Ondilo account again";
    pub const FORBIDDEN: &str = "Access to this pool is not allowed for the current account";
    pub const NOT_FOUND: &str = "Pool not found, it may have been removed from your account";
    pub const SERVER_ERROR: &str = "The Ondilo service is unavailable, please try again later";
    pub const NETWORK: &str = "Could not reach the Ondilo service, check your internet connection";
    pub const INVALID_RESPONSE: &str = "Received an unexpected response from the Ondilo service";
    pub const UNKNOWN: &str = "An unknown error occurred";
}

/// Failure category shared by every API operation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr,
)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    ServerError,
    NetworkError,
    InvalidResponse,
    Unknown,
}

/// Top-level error type for the `poolsync-api` crate.
///
/// The `Display` output of every classified variant is the human-readable
/// message, so callers can surface it directly as an availability reason.
#[derive(Debug, Error)]
pub enum Error {
    // ── HTTP status ─────────────────────────────────────────────────
    /// 401 or 403.
    #[error("{message}")]
    Unauthorized { message: String, status: u16 },

    /// 404.
    #[error("{message}")]
    NotFound { message: String, status: u16 },

    /// Any 5xx.
    #[error("{message}")]
    ServerError { message: String, status: u16 },

    /// Non-2xx status outside the categories above.
    #[error("{message}")]
    Unknown { message: String, status: Option<u16> },

    // ── Transport ───────────────────────────────────────────────────
    /// Connection refused, timeout, DNS failure, interrupted body.
    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// 2xx response whose body is not the expected JSON document.
    #[error("{message}")]
    InvalidResponse {
        message: String,
        status: u16,
        body: String,
    },

    // ── Session ─────────────────────────────────────────────────────
    /// The session could not hand out an access token.
    #[error("Access token unavailable: {0}")]
    Session(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl Error {
    /// Classify a non-2xx response.
    ///
    /// The status picks the category; a vendor error carried in the body
    /// replaces the category message when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let vendor = vendor_message(body);
        let message = |fallback: &str| vendor.clone().unwrap_or_else(|| fallback.to_owned());

        match status {
            401 => Self::Unauthorized {
                message: message(messages::UNAUTHORIZED),
                status,
            },
            403 => Self::Unauthorized {
                message: message(messages::FORBIDDEN),
                status,
            },
            404 => Self::NotFound {
                message: message(messages::NOT_FOUND),
                status,
            },
            500..=599 => Self::ServerError {
                message: message(messages::SERVER_ERROR),
                status,
            },
            _ => Self::Unknown {
                message: message(messages::UNKNOWN),
                status: Some(status),
            },
        }
    }

    /// Wrap a transport-level failure.
    pub fn network(source: reqwest::Error) -> Self {
        Self::Network {
            message: messages::NETWORK.to_owned(),
            source,
        }
    }

    /// A 2xx response that could not be interpreted.
    pub fn invalid_response(status: u16, body: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: messages::INVALID_RESPONSE.to_owned(),
            status,
            body: body.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } | Self::Session(_) => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ServerError { .. } => ErrorKind::ServerError,
            Self::Network { .. } => ErrorKind::NetworkError,
            Self::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            Self::Unknown { .. } | Self::InvalidUrl(_) | Self::Client(_) => ErrorKind::Unknown,
        }
    }

    /// HTTP status of the response that caused this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. }
            | Self::NotFound { status, .. }
            | Self::ServerError { status, .. }
            | Self::InvalidResponse { status, .. } => Some(*status),
            Self::Unknown { status, .. } => *status,
            Self::Network { source, .. } => source.status().map(|s| s.as_u16()),
            Self::Session(_) | Self::InvalidUrl(_) | Self::Client(_) => None,
        }
    }

    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_expired(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    /// Returns `true` if a later attempt has a fair chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NetworkError | ErrorKind::ServerError
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Extract the vendor's description from an error body.
///
/// `error_description` wins over `error`; `error` may be a plain string or an
/// object with a `message` field.
fn vendor_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    if let Some(description) = object.get("error_description").and_then(Value::as_str) {
        return non_empty(description);
    }

    match object.get("error")? {
        Value::String(error) => non_empty(error),
        Value::Object(error) => error
            .get("message")
            .and_then(Value::as_str)
            .and_then(non_empty),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_are_unauthorized() {
        for status in [401, 403] {
            let err = Error::from_status(status, "");
            assert_eq!(err.kind(), ErrorKind::Unauthorized);
            assert_eq!(err.status(), Some(status));
            assert!(err.is_auth_expired());
        }
    }

    #[test]
    fn not_found_and_server_errors() {
        assert_eq!(Error::from_status(404, "").kind(), ErrorKind::NotFound);
        for status in [500, 502, 503, 599] {
            let err = Error::from_status(status, "<html>oops</html>");
            assert_eq!(err.kind(), ErrorKind::ServerError);
            assert_eq!(err.to_string(), messages::SERVER_ERROR);
            assert!(err.is_transient());
        }
    }

    #[test]
    fn other_statuses_are_unknown() {
        let err = Error::from_status(429, "");
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.to_string(), messages::UNKNOWN);
    }

    #[test]
    fn error_description_is_preferred() {
        let body = r#"{"error":"invalid_token","error_description":"The access token expired"}"#;
        let err = Error::from_status(401, body);
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.to_string(), "The access token expired");
    }

    #[test]
    fn nested_error_message_is_used() {
        let body = r#"{"error":{"code":42,"message":"Pool 12 is archived"}}"#;
        assert_eq!(
            Error::from_status(400, body).to_string(),
            "Pool 12 is archived"
        );
    }

    #[test]
    fn plain_error_string_is_used() {
        let body = r#"{"error":"quota exceeded"}"#;
        assert_eq!(Error::from_status(503, body).to_string(), "quota exceeded");
    }

    #[test]
    fn blank_vendor_message_falls_back_to_category() {
        let body = r#"{"error":"   "}"#;
        assert_eq!(Error::from_status(404, body).to_string(), messages::NOT_FOUND);
    }

    #[test]
    fn invalid_response_keeps_status() {
        let err = Error::invalid_response(200, "not json");
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert_eq!(err.status(), Some(200));
        assert!(!err.is_transient());
    }

    #[test]
    fn kind_names_render() {
        assert_eq!(ErrorKind::NetworkError.to_string(), "NetworkError");
        assert_eq!(ErrorKind::InvalidResponse.as_ref(), "InvalidResponse");
    }
}
