//! Proxy resolution
//!
//! A proxy is given as `[user:pass@]host:port`, optionally prefixed with a
//! scheme. The explicit setting wins; otherwise the conventional
//! `HTTPS_PROXY`/`HTTP_PROXY` variable is picked by the target URL's scheme.
//! Nothing is cached: the proxy is resolved again for every request.

use tracing::debug;
use url::Url;

use crate::error::{HttpError, Result};

/// Credentials sent to the proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

/// A parsed tunneling proxy endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub auth: Option<ProxyAuth>,
}

impl ProxyConfig {
    /// Parse `[user:pass@]host:port`.
    ///
    /// Returns `None` when no port can be found; such strings mean "no proxy".
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))
            .unwrap_or(trimmed);
        let trimmed = trimmed.trim_end_matches('/');
        if trimmed.is_empty() {
            return None;
        }

        let (auth, endpoint) = match trimmed.split_once('@') {
            Some((auth, endpoint)) => (Some(auth), endpoint),
            None => (None, trimmed),
        };

        let (host, port) = endpoint.split_once(':')?;
        if host.is_empty() {
            return None;
        }
        let port: u16 = port.parse().ok()?;

        let auth = auth.filter(|a| !a.is_empty()).map(|a| match a.split_once(':') {
            Some((user, pass)) => ProxyAuth {
                username: user.to_string(),
                password: pass.to_string(),
            },
            None => ProxyAuth {
                username: a.to_string(),
                password: String::new(),
            },
        });

        Some(Self {
            host: host.to_string(),
            port,
            auth,
        })
    }

    /// Resolve the proxy for a request to `target`.
    pub fn resolve(explicit: Option<&str>, target: &Url) -> Option<Self> {
        if let Some(explicit) = explicit.filter(|p| !p.trim().is_empty()) {
            return Self::parse(explicit);
        }

        let key = env_key(target.scheme());
        let value = std::env::var(key)
            .ok()
            .or_else(|| std::env::var(key.to_lowercase()).ok())?;
        debug!(variable = key, "Using proxy from environment");
        Self::parse(&value)
    }

    /// Proxy URL without credentials
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Build the reqwest proxy. HTTPS targets are tunneled with CONNECT.
    pub fn to_reqwest(&self) -> Result<reqwest::Proxy> {
        let proxy =
            reqwest::Proxy::all(self.url()).map_err(|e| HttpError::InvalidProxy(e.to_string()))?;
        Ok(match &self.auth {
            Some(auth) => proxy.basic_auth(&auth.username, &auth.password),
            None => proxy,
        })
    }
}

/// Environment variable consulted for a URL scheme
pub fn env_key(scheme: &str) -> &'static str {
    if scheme.starts_with("https") {
        "HTTPS_PROXY"
    } else {
        "HTTP_PROXY"
    }
}
