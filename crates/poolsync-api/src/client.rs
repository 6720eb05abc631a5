// Pool API HTTP client
//
// Wraps `reqwest::Client` with URL construction, bearer authentication and
// response classification. Endpoint methods live in `pools.rs` as inherent
// methods to keep this module focused on transport mechanics.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Error;
use crate::session::TokenSource;
use crate::transport::TransportConfig;

/// Longest body excerpt written to the log for a failed request.
const LOGGED_BODY_LIMIT: usize = 512;

/// HTTP client for the Ondilo customer API.
///
/// Every request carries the bearer token handed out by the session. Non-2xx
/// responses, transport failures and unreadable bodies come back as a
/// classified [`Error`]; nothing is retried here.
#[derive(Clone)]
pub struct PoolClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<dyn TokenSource>,
}

impl PoolClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API root, e.g. `https://interop.ondilo.com/api/customer/v1`.
    pub fn new(
        base_url: Url,
        session: Arc<dyn TokenSource>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, session))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, session: Arc<dyn TokenSource>) -> Self {
        Self {
            http,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Join `path` onto the base URL, keeping any path prefix the base has.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and return the JSON document, if any.
    ///
    /// `None` means the API answered 2xx with an empty body or `null`.
    /// Bodies that are not a JSON object or array are rejected.
    pub(crate) async fn get_document(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<(u16, Option<Value>), Error> {
        let url = self.api_url(path)?;
        debug!(%url, "GET");

        let token = self.session.access_token().await?;

        let mut request = self.http.get(url).bearer_auth(token.expose_secret());
        if !query.is_empty() {
            request = request.query(query);
        }

        let resp = request.send().await.map_err(|e| {
            warn!(error = %e, path, "request failed");
            Error::network(e)
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(Error::network)?;

        if !(200..300).contains(&status) {
            let err = Error::from_status(status, &body);
            warn!(
                status,
                kind = %err.kind(),
                body = excerpt(&body),
                path,
                "request not OK"
            );
            return Err(err);
        }

        trace!(status, body = excerpt(&body), "response");

        if body.trim().is_empty() {
            return Ok((status, None));
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Null) => Ok((status, None)),
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Ok((status, Some(value))),
            _ => {
                warn!(status, body = excerpt(&body), path, "response is not a JSON document");
                Err(Error::invalid_response(status, body))
            }
        }
    }

    /// Send a GET request and deserialize the JSON document into `T`.
    ///
    /// An empty body, or a document of the wrong shape, is an
    /// [`Error::InvalidResponse`].
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        let (status, document) = self.get_document(path, query).await?;

        let Some(value) = document else {
            return Err(Error::invalid_response(status, ""));
        };

        T::deserialize(&value).map_err(|e| {
            warn!(error = %e, path, "unexpected response shape");
            Error::invalid_response(status, value.to_string())
        })
    }

    /// Send a GET request for a list. An empty or `null` body is an empty
    /// list rather than an error.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, Error> {
        let (status, document) = self.get_document(path, query).await?;

        let Some(value) = document else {
            return Ok(Vec::new());
        };

        Vec::<T>::deserialize(&value).map_err(|e| {
            warn!(error = %e, path, "unexpected response shape");
            Error::invalid_response(status, value.to_string())
        })
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(LOGGED_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
