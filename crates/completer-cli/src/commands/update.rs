// Update the engine to the latest published version

use async_trait::async_trait;
use completer_client::EngineClient;
use completer_install::UpdateOutcome;

use super::Command;
use crate::{error::CliResult, progress::download_progress};

pub struct UpdateCommand {
    force: bool,
    quiet: bool,
}

impl UpdateCommand {
    pub fn new(force: bool, quiet: bool) -> Self {
        Self { force, quiet }
    }
}

#[async_trait]
impl Command for UpdateCommand {
    async fn execute(&self, client: &EngineClient) -> CliResult<()> {
        let (pb, progress) = download_progress("Downloading engine", self.quiet);
        let result = client.update(self.force, Some(progress)).await;
        pb.finish_and_clear();

        match result? {
            UpdateOutcome::Installed(binary) => {
                println!("Installed {} at {}", binary.version, binary.path.display());
            }
            UpdateOutcome::AlreadyLatest(binary) => {
                println!(
                    "Latest version {} already installed; use --force to reinstall",
                    binary.version
                );
            }
        }
        Ok(())
    }
}
