//! Pooled HTTP client that attaches bearer tokens

use crate::auth::AccessTokenProvider;
use crate::config::SheetsClientConfig;
use crate::error::{HttpError, HttpResult};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use url::Url;

/// Async HTTP client for the Sheets endpoints
///
/// Cheap to clone; clones share one connection pool.
///
/// ```ignore
/// let client = SheetsHttpClient::new(
///     SheetsClientConfig::new().timeout_secs(30.0),
///     Arc::new(StaticToken::new(token)),
/// )?;
/// ```
#[derive(Clone)]
pub struct SheetsHttpClient {
    inner: Arc<SheetsHttpClientInner>,
}

struct SheetsHttpClientInner {
    client: reqwest::Client,
    config: SheetsClientConfig,
    auth: Arc<dyn AccessTokenProvider>,
}

impl SheetsHttpClient {
    /// Create a new client with the given configuration and token source
    pub fn new(
        config: SheetsClientConfig,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> HttpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(&config.user_agent)
            .gzip(config.gzip)
            .build()?;

        Ok(Self {
            inner: Arc::new(SheetsHttpClientInner {
                client,
                config,
                auth,
            }),
        })
    }

    /// Client configuration
    pub fn config(&self) -> &SheetsClientConfig {
        &self.inner.config
    }

    /// Build `{base}/{segments...}` with each segment percent-encoded
    pub fn endpoint(&self, base: &str, segments: &[&str]) -> HttpResult<Url> {
        let mut url = Url::parse(base)?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                HttpError::InvalidRequest(format!("base url cannot take a path: {}", base))
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// Send a JSON body and decode a JSON response
    pub async fn send_json<B, T>(&self, method: Method, url: Url, body: &B) -> HttpResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| HttpError::Json(format!("Failed to serialize request: {}", e)))?;
        let text = self.execute(method, url, Some(body)).await?;
        serde_json::from_str(&text)
            .map_err(|e| HttpError::Json(format!("Failed to deserialize JSON: {}", e)))
    }

    /// GET and decode a JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> HttpResult<T> {
        let text = self.get_text(url).await?;
        serde_json::from_str(&text)
            .map_err(|e| HttpError::Json(format!("Failed to deserialize JSON: {}", e)))
    }

    /// GET and return the raw body text
    pub async fn get_text(&self, url: Url) -> HttpResult<String> {
        self.execute(Method::GET, url, None).await
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> HttpResult<String> {
        let token = self.inner.auth.access_token().await?;
        let start = Instant::now();

        let mut request = self
            .inner
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        debug!(
            method = %method,
            path = url.path(),
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "sheets request"
        );

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}
