//! Client configuration loading
//!
//! Settings come from an optional TOML file layered under `COMPLETER_*`
//! environment variables (`COMPLETER_BINARY_PATH`, `COMPLETER_MAX_RESTARTS`, ...).

use std::path::{Path, PathBuf};
use std::time::Duration;

use completer_http::HttpConfig;
use completer_install::ProvisionerConfig;
use completer_process::{DEFAULT_CLIENT_NAME, DEFAULT_MAX_RESTARTS};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    broker::{DEFAULT_REPLY_DEADLINE, DEFAULT_REQUEST_TIMEOUT},
    error::{ClientError, Result},
    protocol::DEFAULT_PROTOCOL_VERSION,
};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "COMPLETER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleterConfig {
    /// Launch this executable instead of a provisioned one
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Client data folder; provisioned binaries go to `<storage_path>/binaries`
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    #[serde(default = "default_client_name")]
    pub client_name: String,

    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,

    /// Caller-side wait bound per request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: Option<u64>,

    /// An engine silent for this long after a request is killed
    #[serde(default = "default_reply_deadline_ms")]
    pub reply_deadline_ms: u64,

    /// `[user:pass@]host:port`; falls back to `HTTPS_PROXY`/`HTTP_PROXY`
    #[serde(default)]
    pub http_proxy: Option<String>,

    #[serde(default)]
    pub version_url: Option<String>,

    #[serde(default)]
    pub download_base_url: Option<String>,

    #[serde(default)]
    pub bundle_name: Option<String>,

    #[serde(default)]
    pub executable_name: Option<String>,

    #[serde(default)]
    pub executables: Option<Vec<String>>,
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("completer")
}

fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}

fn default_client_name() -> String {
    DEFAULT_CLIENT_NAME.to_string()
}

fn default_max_restarts() -> u32 {
    DEFAULT_MAX_RESTARTS
}

fn default_request_timeout_ms() -> Option<u64> {
    Some(DEFAULT_REQUEST_TIMEOUT.as_millis() as u64)
}

fn default_reply_deadline_ms() -> u64 {
    DEFAULT_REPLY_DEADLINE.as_millis() as u64
}

impl Default for CompleterConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            storage_path: default_storage_path(),
            protocol_version: default_protocol_version(),
            client_name: default_client_name(),
            max_restarts: default_max_restarts(),
            request_timeout_ms: default_request_timeout_ms(),
            reply_deadline_ms: default_reply_deadline_ms(),
            http_proxy: None,
            version_url: None,
            download_base_url: None,
            bundle_name: None,
            executable_name: None,
            executables: None,
        }
    }
}

impl CompleterConfig {
    /// `<config_dir>/completer/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("completer")
            .join("config.toml")
    }

    /// Load from the default file location and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_config_path())
    }

    /// Load from `path` (missing is fine) and the environment, then validate
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading configuration");
        let settings = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.protocol_version.trim().is_empty() {
            return Err(ClientError::config("protocol_version must not be empty"));
        }
        if self.max_restarts == 0 {
            return Err(ClientError::config("max_restarts must be greater than 0"));
        }
        if self.client_name.trim().is_empty() {
            return Err(ClientError::config("client_name must not be empty"));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ClientError::config("request_timeout_ms must be greater than 0"));
        }
        if self.reply_deadline_ms == 0 {
            return Err(ClientError::config("reply_deadline_ms must be greater than 0"));
        }
        if let Some(path) = &self.binary_path {
            if !path.exists() {
                return Err(ClientError::BinaryPathMissing(path.clone()));
            }
        }
        Ok(())
    }

    /// Root of the version directory
    pub fn binaries_root(&self) -> PathBuf {
        self.storage_path.join("binaries")
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn reply_deadline(&self) -> Duration {
        Duration::from_millis(self.reply_deadline_ms)
    }

    pub fn http_config(&self) -> HttpConfig {
        match self.http_proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(proxy) => HttpConfig::default().with_proxy(proxy),
            None => HttpConfig::default(),
        }
    }

    pub fn provisioner_config(&self) -> ProvisionerConfig {
        let mut config = ProvisionerConfig::default();
        if let Some(url) = &self.version_url {
            config.version_url = url.clone();
        }
        if let Some(url) = &self.download_base_url {
            config.download_base_url = url.clone();
        }
        if let Some(name) = &self.bundle_name {
            config.bundle_name = name.clone();
        }
        if let Some(name) = &self.executable_name {
            config.executable_name = name.clone();
        }
        if let Some(names) = &self.executables {
            config.executables = names.clone();
        }
        config
    }
}
