// Command handlers for the completer CLI

pub mod complete;
pub mod config_dir;
pub mod install;
pub mod request;
pub mod update;
pub mod which;

pub use complete::CompleteCommand;
pub use config_dir::ConfigDirCommand;
pub use install::InstallCommand;
pub use request::RequestCommand;
pub use update::UpdateCommand;
pub use which::WhichCommand;

use completer_client::EngineClient;

use crate::error::CliResult;

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command against a configured client
    async fn execute(&self, client: &EngineClient) -> CliResult<()>;
}
