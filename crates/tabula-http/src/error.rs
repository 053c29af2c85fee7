//! HTTP error types and handling

use regex::Regex;
use std::sync::OnceLock;
use tabula_common::TabulaError;
use thiserror::Error;

/// HTTP-specific errors
#[derive(Error, Debug)]
pub enum HttpError {
    /// Could not obtain an access token
    #[error("Auth error: {0}")]
    Auth(String),

    /// Invalid request configuration
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Non-success status from the backend
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response parsing error
    #[error("Response error: {0}")]
    ResponseError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(String),

    /// Generic reqwest error
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type for HTTP operations
pub type HttpResult<T> = Result<T, HttpError>;

/// Error category for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorCategory {
    /// Connection-related errors (DNS, TCP, TLS)
    Connection,
    /// Timeout errors
    Timeout,
    /// Invalid request construction or credentials
    Request,
    /// Response parsing or status errors
    Response,
    /// Unknown/other errors
    Unknown,
}

impl HttpError {
    /// Categorize the error for reporting
    pub fn category(&self) -> HttpErrorCategory {
        match self {
            HttpError::Auth(_) | HttpError::InvalidRequest(_) | HttpError::UrlParse(_) => {
                HttpErrorCategory::Request
            }
            HttpError::Status { .. } | HttpError::ResponseError(_) | HttpError::Json(_) => {
                HttpErrorCategory::Response
            }
            HttpError::Reqwest(e) => {
                if e.is_connect() {
                    HttpErrorCategory::Connection
                } else if e.is_timeout() {
                    HttpErrorCategory::Timeout
                } else if e.is_request() {
                    HttpErrorCategory::Request
                } else {
                    HttpErrorCategory::Unknown
                }
            }
        }
    }

    /// Message with bearer and `access_token` credentials redacted
    pub fn redacted_message(&self) -> String {
        redact_credentials(&self.to_string())
    }
}

impl From<HttpError> for TabulaError {
    fn from(err: HttpError) -> Self {
        TabulaError::Backend(err.redacted_message())
    }
}

fn credential_pattern() -> &'static Regex {
    static CREDENTIAL_RE: OnceLock<Regex> = OnceLock::new();
    CREDENTIAL_RE.get_or_init(|| {
        Regex::new(r#"(?i)(bearer\s+|access_token"?\s*[:=]\s*"?)[A-Za-z0-9._~+/=-]+"#)
            .expect("valid regex")
    })
}

/// OAuth tokens can surface in reqwest errors (request URLs) and in echoed
/// API error bodies.
fn redact_credentials(msg: &str) -> String {
    credential_pattern()
        .replace_all(msg, "${1}[REDACTED]")
        .into_owned()
}
