//! Error types for engine requests

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use completer_http::HttpError;
use completer_install::InstallError;
use completer_process::ProcessError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// No live engine process; nothing was written
    #[error("Engine process unavailable: {0}")]
    ProcessUnavailable(#[source] ProcessError),

    /// Writing the request or reading the reply failed, or the engine closed its output
    #[error("Engine request failed: {0}")]
    RequestFailed(#[source] io::Error),

    /// The reply line was not the expected JSON
    #[error("Invalid engine reply: {0}")]
    ProtocolError(String),

    /// The caller stopped waiting; the engine reply is still drained
    #[error("Engine request timed out after {0:?}")]
    Timeout(Duration),

    /// A query that needs at least one result got none
    #[error("Engine returned no results for {0}")]
    EmptyResponse(String),

    /// Updates are disabled for a user-configured binary
    #[error("Can't update user defined engine binary: {}", .0.display())]
    UserDefinedBinary(PathBuf),

    /// Configured binary path does not exist
    #[error("Specified engine binary not found: {}", .0.display())]
    BinaryPathMissing(PathBuf),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request could not be serialized
    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// The request task ended without producing a reply
    #[error("Request task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Http(#[from] HttpError),
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl ClientError {
    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::ProtocolError(message.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Whether a later request may succeed without user action
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::RequestFailed(_) | ClientError::ProtocolError(_) | ClientError::Timeout(_)
        )
    }
}
