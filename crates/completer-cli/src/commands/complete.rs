// Complete at a byte offset in a file

use std::path::PathBuf;

use async_trait::async_trait;
use completer_client::{AutocompleteRequest, EngineClient};

use super::Command;
use crate::error::{CliError, CliResult};

pub struct CompleteCommand {
    file: PathBuf,
    offset: Option<usize>,
    limit: u32,
}

impl CompleteCommand {
    pub fn new(file: PathBuf, offset: Option<usize>, limit: u32) -> Self {
        Self { file, offset, limit }
    }

    fn build_request(&self, text: &str) -> CliResult<AutocompleteRequest> {
        let offset = self.offset.unwrap_or(text.len());
        if offset > text.len() {
            return Err(CliError::invalid_argument(format!(
                "offset {} is past the end of {} ({} bytes)",
                offset,
                self.file.display(),
                text.len()
            )));
        }
        Ok(
            AutocompleteRequest::from_buffer(self.file.display().to_string(), text, offset)
                .max_num_results(self.limit),
        )
    }
}

#[async_trait]
impl Command for CompleteCommand {
    async fn execute(&self, client: &EngineClient) -> CliResult<()> {
        let text = tokio::fs::read_to_string(&self.file).await?;
        let request = self.build_request(&text)?;
        client.ensure_installed(None).await?;

        let response = client.autocomplete(request).await?;
        for entry in &response.results {
            match &entry.detail {
                Some(detail) => println!("{}\t{}", entry.label(), detail),
                None => println!("{}", entry.label()),
            }
        }
        let message = response.detail_message();
        if !message.is_empty() {
            eprintln!("{}", message);
        }
        client.shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_defaults_to_end() {
        let cmd = CompleteCommand::new("a.rs".into(), None, 3);
        let req = cmd.build_request("fn main").unwrap();
        assert_eq!(req.before, "fn main");
        assert_eq!(req.after, "");
        assert_eq!(req.max_num_results, Some(3));
    }

    #[test]
    fn test_offset_past_end_is_rejected() {
        let cmd = CompleteCommand::new("a.rs".into(), Some(99), 5);
        assert!(matches!(
            cmd.build_request("short"),
            Err(CliError::InvalidArgument { .. })
        ));
    }
}
