// Send a raw JSON request and print the reply

use async_trait::async_trait;
use completer_client::EngineClient;
use serde_json::Value;

use super::Command;
use crate::error::{CliError, CliResult};

pub struct RequestCommand {
    payload: String,
    version: Option<String>,
}

impl RequestCommand {
    pub fn new(payload: String, version: Option<String>) -> Self {
        Self { payload, version }
    }

    fn parse_payload(&self) -> CliResult<Value> {
        serde_json::from_str(&self.payload)
            .map_err(|e| CliError::invalid_argument(format!("request is not valid JSON: {}", e)))
    }
}

#[async_trait]
impl Command for RequestCommand {
    async fn execute(&self, client: &EngineClient) -> CliResult<()> {
        let payload = self.parse_payload()?;
        client.ensure_installed(None).await?;

        let reply = match &self.version {
            Some(version) => client.request_version(version, &payload).await?,
            None => client.request(&payload).await?,
        };
        println!("{}", reply);
        client.shutdown().await;
        Ok(())
    }
}
