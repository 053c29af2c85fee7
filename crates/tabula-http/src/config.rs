//! Sheets client configuration

use std::time::Duration;

/// Default base URL of the Sheets v4 spreadsheets resource
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Default base URL of the gviz query endpoint (`{base}/{id}/gviz/tq`)
pub const DEFAULT_QUERY_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";

/// Configuration for the Sheets HTTP client
#[derive(Debug, Clone)]
pub struct SheetsClientConfig {
    /// Base URL for values and spreadsheet calls
    pub sheets_base_url: String,

    /// Base URL for gviz query calls
    pub query_base_url: String,

    /// Total request timeout
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Idle connection timeout
    pub pool_idle_timeout: Duration,

    /// User-Agent header value
    pub user_agent: String,

    /// Enable gzip compression
    pub gzip: bool,
}

impl Default for SheetsClientConfig {
    fn default() -> Self {
        Self {
            sheets_base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            query_base_url: DEFAULT_QUERY_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: format!("tabula-http/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
        }
    }
}

impl SheetsClientConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Sheets API base URL
    pub fn sheets_base_url(mut self, url: impl Into<String>) -> Self {
        self.sheets_base_url = url.into();
        self
    }

    /// Set the gviz query base URL
    pub fn query_base_url(mut self, url: impl Into<String>) -> Self {
        self.query_base_url = url.into();
        self
    }

    /// Point both endpoints at one server (used against mock servers)
    pub fn base_url(self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.sheets_base_url(url.clone()).query_base_url(url)
    }

    /// Set the total timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set timeout from seconds
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.timeout = Duration::from_secs_f64(secs);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set max idle connections per host
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Set idle connection timeout
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enable/disable gzip compression
    pub fn gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }
}
