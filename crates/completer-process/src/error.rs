//! Error types for engine process supervision

use std::io;
use std::path::PathBuf;

use completer_install::InstallError;
use thiserror::Error;

/// Process supervision errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be launched
    #[error("Failed to spawn {}: {source}", command.display())]
    SpawnFailed {
        command: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Restart budget exhausted; no further spawn is attempted
    #[error("Engine process unavailable after {restarts} start attempts")]
    Unavailable { restarts: u32 },

    /// No launchable binary could be resolved
    #[error("Failed to resolve engine binary: {0}")]
    Resolve(#[from] InstallError),

    /// Spawned child is missing a piped stdio handle
    #[error("Engine process has no {0} pipe")]
    MissingPipe(&'static str),

    /// Invalid configuration
    #[error("Invalid process configuration: {0}")]
    InvalidConfig(String),
}

impl ProcessError {
    pub fn spawn_failed(command: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            source,
        }
    }
}

/// Result type for process operations
pub type Result<T> = std::result::Result<T, ProcessError>;
