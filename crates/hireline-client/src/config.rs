//! Client configuration.

use std::time::Duration;

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`crate::RestBridge`].
#[derive(Debug, Clone)]
pub struct Config {
    /// API base URL, without a trailing slash.
    pub base_url: String,
    /// Optional bearer token.
    pub api_token: Option<String>,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a config for the given base URL with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            api_token: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Reads the endpoint and token from the environment, falling back to
    /// defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("HIRELINE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(base_url);
        config.api_token = std::env::var("HIRELINE_API_TOKEN").ok();
        config
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Overrides the timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}
