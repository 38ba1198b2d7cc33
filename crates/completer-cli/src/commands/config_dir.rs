// Ask the engine where its configuration lives

use async_trait::async_trait;
use completer_client::EngineClient;

use super::Command;
use crate::error::CliResult;

pub struct ConfigDirCommand {
    file: bool,
    hub: bool,
}

impl ConfigDirCommand {
    pub fn new(file: bool, hub: bool) -> Self {
        Self { file, hub }
    }
}

#[async_trait]
impl Command for ConfigDirCommand {
    async fn execute(&self, client: &EngineClient) -> CliResult<()> {
        client.ensure_installed(None).await?;

        if self.hub {
            client.open_hub().await?;
        }
        let path = if self.file {
            client.config_file().await?
        } else {
            client.config_dir().await?
        };
        println!("{}", path.display());
        client.shutdown().await;
        Ok(())
    }
}
