//! Client configuration

use std::time::Duration;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Connection settings shared by every request issued through an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every request path is appended to (no trailing slash).
    pub base_url: String,
    /// Headers applied to every request unless overridden per call.
    pub default_headers: Vec<(String, String)>,
    /// Deadline applied to requests that do not opt out.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with default headers and timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            ..Self::default()
        }
    }

    /// Replace the default deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add (or replace) a default header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.default_headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.default_headers.push((name, value.into()));
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn normalize_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
