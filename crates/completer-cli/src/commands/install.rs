// Install the engine if no usable version is present

use async_trait::async_trait;
use completer_client::EngineClient;

use super::Command;
use crate::{error::CliResult, progress::download_progress};

pub struct InstallCommand {
    quiet: bool,
}

impl InstallCommand {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

#[async_trait]
impl Command for InstallCommand {
    async fn execute(&self, client: &EngineClient) -> CliResult<()> {
        let (pb, progress) = download_progress("Downloading engine", self.quiet);
        let result = client.ensure_installed(Some(progress)).await;
        pb.finish_and_clear();

        let path = result?;
        println!("{}", path.display());
        Ok(())
    }
}
