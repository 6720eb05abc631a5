// Access token boundary
//
// The OAuth2 session (authorization, refresh, storage) lives outside this
// crate. The client only asks it for the token to put on the next request.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::Error;

/// Supplies bearer tokens from an already-authenticated OAuth2 session.
///
/// Implementations are expected to refresh expired tokens on their own;
/// the client never retries and never stores tokens.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<SecretString, Error>;
}

/// A fixed token, for scripts and tests.
#[derive(Clone)]
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

impl From<SecretString> for StaticToken {
    fn from(token: SecretString) -> Self {
        Self(token)
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken([REDACTED])")
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<SecretString, Error> {
        Ok(self.0.clone())
    }
}
