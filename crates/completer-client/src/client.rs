//! Engine client facade
//!
//! Wires configuration, provisioning and the request broker together.

use std::path::{Path, PathBuf};

use completer_http::{shared_client, ProgressFn};
use completer_install::{InstalledBinary, Provisioner, UpdateOutcome};
use completer_process::{BinarySource, ProcessSupervisor, SupervisorConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::{
    broker::RequestBroker,
    config::CompleterConfig,
    error::{ClientError, Result},
    protocol::{AutocompleteRequest, AutocompleteResponse, ConfigurationRequest, EngineRequest},
};

/// File name of the engine's own settings inside its config directory
pub const ENGINE_CONFIG_FILE: &str = "tabnine_config.json";

/// High-level access to the completion engine
pub struct EngineClient {
    config: CompleterConfig,
    provisioner: Provisioner,
    broker: RequestBroker,
}

impl EngineClient {
    /// Build a client for the running platform
    pub fn new(config: CompleterConfig) -> Result<Self> {
        let http = shared_client(config.http_config())?;
        let provisioner = Provisioner::new(http, config.provisioner_config())?;
        Self::with_provisioner(config, provisioner)
    }

    /// Build a client around an existing provisioner
    pub fn with_provisioner(config: CompleterConfig, provisioner: Provisioner) -> Result<Self> {
        config.validate()?;

        let source = match &config.binary_path {
            Some(path) => BinarySource::Explicit(path.clone()),
            None => BinarySource::Installed(provisioner.version_directory(config.binaries_root())),
        };
        let supervisor_config = SupervisorConfig::new(source)
            .client_name(config.client_name.clone())
            .max_restarts(config.max_restarts);
        let supervisor =
            ProcessSupervisor::new(supervisor_config).map_err(ClientError::ProcessUnavailable)?;
        let broker = RequestBroker::new(supervisor)
            .with_timeout(config.request_timeout())
            .with_reply_deadline(config.reply_deadline());

        Ok(Self {
            config,
            provisioner,
            broker,
        })
    }

    pub fn config(&self) -> &CompleterConfig {
        &self.config
    }

    pub fn provisioner(&self) -> &Provisioner {
        &self.provisioner
    }

    pub fn broker(&self) -> &RequestBroker {
        &self.broker
    }

    pub fn binaries_root(&self) -> PathBuf {
        self.config.binaries_root()
    }

    /// User-configured binary, if any
    pub fn user_binary(&self) -> Option<&Path> {
        self.config.binary_path.as_deref()
    }

    /// Path of the binary the next start would launch, installing the latest
    /// version first when nothing usable is present
    pub async fn ensure_installed(&self, progress: Option<ProgressFn>) -> Result<PathBuf> {
        if let Some(path) = self.user_binary() {
            if !path.exists() {
                return Err(ClientError::BinaryPathMissing(path.to_path_buf()));
            }
            info!(path = %path.display(), "Using user defined engine binary");
            return Ok(path.to_path_buf());
        }
        let binary = self
            .provisioner
            .ensure_installed(&self.binaries_root(), progress)
            .await?;
        Ok(binary.path)
    }

    /// Reinstall the latest version
    pub async fn force_update(&self, progress: Option<ProgressFn>) -> Result<InstalledBinary> {
        self.refuse_user_binary()?;
        Ok(self
            .provisioner
            .force_update(&self.binaries_root(), progress)
            .await?)
    }

    /// Install the latest version unless it is already present (or `force`)
    pub async fn update(&self, force: bool, progress: Option<ProgressFn>) -> Result<UpdateOutcome> {
        self.refuse_user_binary()?;
        Ok(self
            .provisioner
            .update(&self.binaries_root(), force, progress)
            .await?)
    }

    fn refuse_user_binary(&self) -> Result<()> {
        match self.user_binary() {
            Some(path) => Err(ClientError::UserDefinedBinary(path.to_path_buf())),
            None => Ok(()),
        }
    }

    /// Send a payload with the configured protocol version
    pub async fn request<T: Serialize>(&self, payload: &T) -> Result<Value> {
        self.broker
            .request(&self.config.protocol_version, payload)
            .await
    }

    /// Send a payload with an explicit protocol version
    pub async fn request_version<T: Serialize>(&self, version: &str, payload: &T) -> Result<Value> {
        self.broker.request(version, payload).await
    }

    async fn typed<R: DeserializeOwned>(&self, request: &EngineRequest) -> Result<R> {
        let reply = self.request(request).await?;
        serde_json::from_value(reply).map_err(|e| ClientError::protocol(e.to_string()))
    }

    pub async fn autocomplete(&self, request: AutocompleteRequest) -> Result<AutocompleteResponse> {
        self.typed(&EngineRequest::Autocomplete(request)).await
    }

    /// Directory holding the engine's own configuration
    pub async fn config_dir(&self) -> Result<PathBuf> {
        let response = self.autocomplete(AutocompleteRequest::config_dir()).await?;
        response
            .results
            .into_iter()
            .next()
            .map(|entry| PathBuf::from(entry.new_prefix))
            .ok_or_else(|| ClientError::EmptyResponse("TabNine::config_dir".to_string()))
    }

    /// The engine's settings file
    pub async fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir().await?.join(ENGINE_CONFIG_FILE))
    }

    /// Ask the engine to open its configuration hub
    pub async fn open_hub(&self) -> Result<Value> {
        self.request(&EngineRequest::Configuration(ConfigurationRequest {}))
            .await
    }

    /// Replace the engine process, e.g. after a protocol error
    pub async fn respawn(&self) -> Result<()> {
        self.broker.respawn().await
    }

    pub async fn shutdown(&self) {
        self.broker.shutdown().await
    }
}
