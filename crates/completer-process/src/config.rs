//! Process and supervisor configuration

use std::collections::HashMap;
use std::path::PathBuf;

use completer_install::VersionDirectory;

use crate::error::{ProcessError, Result};

/// Default cap on spawn attempts over a supervisor's lifetime
pub const DEFAULT_MAX_RESTARTS: u32 = 10;

/// Default value passed as `--client=<name>`
pub const DEFAULT_CLIENT_NAME: &str = "completer";

/// Configuration for spawning one engine process
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Executable path
    pub command: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
    /// Working directory (None = current dir)
    pub working_dir: Option<PathBuf>,
    /// Environment variables (added to parent env)
    pub env: HashMap<String, String>,
}

impl ProcessConfig {
    /// Create new process configuration
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: vec![],
            working_dir: None,
            env: HashMap::new(),
        }
    }

    /// Set command arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Where the engine executable comes from
#[derive(Debug, Clone)]
pub enum BinarySource {
    /// User-configured executable, launched as is
    Explicit(PathBuf),
    /// Newest usable binary under a version root, re-resolved on every start
    Installed(VersionDirectory),
}

/// Supervisor settings
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub source: BinarySource,
    /// Identifies this client to the engine (`--client=<name>`)
    pub client_name: String,
    /// Ceiling on spawn attempts; never reset
    pub max_restarts: u32,
    /// Extra arguments after `--client=<name>`
    pub extra_args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl SupervisorConfig {
    pub fn new(source: BinarySource) -> Self {
        Self {
            source,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            max_restarts: DEFAULT_MAX_RESTARTS,
            extra_args: vec![],
            env: HashMap::new(),
        }
    }

    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn max_restarts(mut self, max: u32) -> Self {
        self.max_restarts = max;
        self
    }

    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_restarts == 0 {
            return Err(ProcessError::InvalidConfig(
                "max_restarts must be at least 1".to_string(),
            ));
        }
        if self.client_name.trim().is_empty() {
            return Err(ProcessError::InvalidConfig(
                "client name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Launch configuration for a resolved executable
    pub fn process_config(&self, command: impl Into<PathBuf>) -> ProcessConfig {
        let mut args = vec![format!("--client={}", self.client_name)];
        args.extend(self.extra_args.iter().cloned());

        let mut config = ProcessConfig::new(command).args(args);
        config.env = self.env.clone();
        config
    }
}
