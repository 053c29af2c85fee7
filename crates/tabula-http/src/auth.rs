//! Access token capability
//!
//! Token acquisition and refresh (service accounts, OAuth2 flows) live outside
//! this crate. The client only asks for a currently valid bearer token before
//! every request.

use crate::error::{HttpError, HttpResult};
use async_trait::async_trait;

/// Supplies bearer tokens for Sheets API calls
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Return a token valid for the next request
    async fn access_token(&self) -> HttpResult<String>;
}

/// Fixed token, for short-lived processes and tests
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> HttpResult<String> {
        if self.token.is_empty() {
            return Err(HttpError::Auth("empty access token".to_string()));
        }
        Ok(self.token.clone())
    }
}
