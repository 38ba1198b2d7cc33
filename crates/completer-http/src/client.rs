//! HTTP client implementation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use tracing::debug;
use url::Url;

use crate::{
    config::HttpConfig,
    error::{HttpError, Result},
    proxy::ProxyConfig,
};

/// Mockable HTTP client trait
#[async_trait]
pub trait HttpClientTrait: Send + Sync {
    /// GET a resource, failing unless the server answers 200 OK.
    /// The body is left unread so callers can stream it.
    async fn get(&self, url: &str) -> Result<Response>;

    /// GET a small text resource with the request timeout applied
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// Production HTTP client
///
/// The underlying reqwest client is rebuilt per request because the proxy
/// depends on the target scheme and on the environment at call time.
pub struct HttpClient {
    config: HttpConfig,
}

impl HttpClient {
    /// Create a new HTTP client with configuration
    pub fn new(config: HttpConfig) -> Result<Self> {
        if let Some(raw) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            if let Some(proxy) = ProxyConfig::parse(raw) {
                proxy.to_reqwest()?;
            }
        }
        Ok(Self { config })
    }

    /// Create HTTP client with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpConfig::default())
    }

    /// Get configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn parse_url(url: &str) -> Result<Url> {
        let parsed = url
            .parse::<Url>()
            .map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(HttpError::InvalidUrl(format!(
                "unsupported scheme '{other}' in {url}"
            ))),
        }
    }

    fn build_for(&self, target: &Url) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .user_agent(&self.config.user_agent)
            .gzip(self.config.gzip)
            .redirect(if self.config.max_redirects > 0 {
                reqwest::redirect::Policy::limited(self.config.max_redirects)
            } else {
                reqwest::redirect::Policy::none()
            });

        builder = match ProxyConfig::resolve(self.config.proxy.as_deref(), target) {
            Some(proxy) => {
                debug!(host = %proxy.host, port = proxy.port, "Routing request through proxy");
                builder.proxy(proxy.to_reqwest()?)
            }
            None => builder.no_proxy(),
        };

        builder
            .build()
            .map_err(|e| HttpError::BuildError(e.to_string()))
    }

    async fn send(&self, url: &str, timeout: Option<Duration>) -> Result<Response> {
        let target = Self::parse_url(url)?;
        let client = self.build_for(&target)?;

        let mut request = client.get(target);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            return Err(HttpError::DownloadFailed {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn get(&self, url: &str) -> Result<Response> {
        debug!("HTTP GET: {}", url);
        self.send(url, None).await
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        debug!("HTTP GET (text): {}", url);
        let response = self.send(url, Some(self.config.request_timeout)).await?;
        Ok(response.text().await?)
    }
}

/// Create a shared HTTP client (Arc-wrapped for cloning)
pub fn shared_client(config: HttpConfig) -> Result<Arc<dyn HttpClientTrait>> {
    Ok(Arc::new(HttpClient::new(config)?))
}
