//! HTTP client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// User agent sent with every request. Some bundle mirrors reject non-browser agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64)";

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Connection timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Timeout for small text requests (version endpoint). Downloads are unbounded.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Explicit proxy in `[user:pass@]host:port` form; falls back to the environment
    #[serde(default)]
    pub proxy: Option<String>,

    /// User agent header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum redirects to follow (0 = no redirects)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Ask the server for gzip transfer encoding
    #[serde(default = "default_gzip")]
    pub gzip: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            proxy: None,
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
            gzip: default_gzip(),
        }
    }
}

impl HttpConfig {
    /// Create a new HTTP config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set proxy string
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

// Default value functions for serde
fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}

fn default_max_redirects() -> usize {
    10
}

fn default_gzip() -> bool {
    true
}
