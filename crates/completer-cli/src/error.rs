// CLI error type and user-facing messages

use completer_client::ClientError;
use completer_install::InstallError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl From<InstallError> for CliError {
    fn from(err: InstallError) -> Self {
        CliError::Client(ClientError::Install(err))
    }
}

impl CliError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CliError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {}\n\nRun 'completer --help' for usage information.", message)
            }
            CliError::Io(e) => format!("File operation failed: {}", e),
            CliError::Config(msg) | CliError::Client(ClientError::Config(msg)) => {
                format!("Configuration error: {}\n\nCheck your config file or COMPLETER_* environment variables.", msg)
            }
            CliError::Client(ClientError::BinaryPathMissing(path)) => format!(
                "Specified engine binary not found: {}\n\nFix binary_path or unset it to use a downloaded engine.",
                path.display()
            ),
            CliError::Client(ClientError::UserDefinedBinary(path)) => format!(
                "Can't update user defined engine: {}\n\nUnset binary_path to let completer manage the engine.",
                path.display()
            ),
            CliError::Client(ClientError::Install(e)) if e.is_missing() => {
                format!("{}\n\nRun 'completer install' to download the engine.", e)
            }
            CliError::Client(ClientError::Install(e)) => match e.download_status() {
                Some(status) => format!("Download failed with HTTP status {}.\n\nCheck your network or proxy settings.", status),
                None => format!("Engine installation failed: {}", e),
            },
            CliError::Client(e @ ClientError::ProcessUnavailable(_)) => {
                format!("{}\n\nRestart completer to reset the engine restart limit.", e)
            }
            CliError::Client(e) => e.to_string(),
        }
    }

    /// Get technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

pub type CliResult<T> = Result<T, CliError>;
