//! tabula-http: Google Sheets transport for tabula
//!
//! Implements the `SheetOperations` capability from `tabula-common` against the
//! Google Sheets v4 values API and the gviz query endpoint.
//!
//! # Architecture
//!
//! - `SheetsHttpClient`: pooled reqwest client that attaches bearer tokens
//! - `GoogleSheets`: `SheetOperations` implementation on top of the client
//! - `AccessTokenProvider`: where tokens come from (refresh lives outside this crate)
//!
//! ```ignore
//! use std::sync::Arc;
//! use tabula_http::{GoogleSheets, SheetsClientConfig, StaticToken};
//!
//! let sheets = GoogleSheets::new(SheetsClientConfig::new(), Arc::new(StaticToken::new(token)))?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod google;
pub mod response;

pub use auth::{AccessTokenProvider, StaticToken};
pub use client::SheetsHttpClient;
pub use config::SheetsClientConfig;
pub use error::{HttpError, HttpErrorCategory, HttpResult};
pub use google::GoogleSheets;
