// Print the engine binary that would be launched

use async_trait::async_trait;
use completer_client::{ClientError, EngineClient};

use super::Command;
use crate::error::CliResult;

pub struct WhichCommand;

#[async_trait]
impl Command for WhichCommand {
    async fn execute(&self, client: &EngineClient) -> CliResult<()> {
        if let Some(path) = client.user_binary() {
            if !path.exists() {
                return Err(ClientError::BinaryPathMissing(path.to_path_buf()).into());
            }
            println!("{} (user defined)", path.display());
            return Ok(());
        }

        let binary = client
            .provisioner()
            .version_directory(client.binaries_root())
            .resolve()?;
        println!("{} ({} {})", binary.path.display(), binary.version, binary.platform_tag());
        Ok(())
    }
}
