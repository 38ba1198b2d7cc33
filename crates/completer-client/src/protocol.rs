//! Line-JSON wire format
//!
//! Every request is one line: `{"version": <tag>, "request": <payload>}`.
//! Every reply is one line of JSON. There is no correlation id; the reply to
//! the n-th line written is the n-th line read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, Result};

/// Protocol version tag sent with every request
pub const DEFAULT_PROTOCOL_VERSION: &str = "2.0.0";

/// Characters of context sent on each side of the cursor
pub const CONTEXT_CHAR_LIMIT: usize = 100_000;

/// Results asked for per completion
pub const DEFAULT_MAX_RESULTS: u32 = 5;

/// Query text that makes the engine answer with its config directory
pub const CONFIG_DIR_QUERY: &str = "TabNine::config_dir";

/// Outbound wrapper
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub version: &'a str,
    pub request: &'a T,
}

/// Serialize a request as one line, without the trailing newline
pub fn encode_request<T: Serialize>(version: &str, request: &T) -> Result<String> {
    serde_json::to_string(&Envelope { version, request }).map_err(ClientError::Encode)
}

/// Parse one reply line
pub fn decode_response(line: &str) -> Result<Value> {
    serde_json::from_str(line).map_err(|e| {
        ClientError::protocol(format!("{e} in reply {:?}", truncate(line, 120)))
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Typed engine requests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EngineRequest {
    Autocomplete(AutocompleteRequest),
    /// Opens the engine's configuration hub
    Configuration(ConfigurationRequest),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigurationRequest {}

/// Completion query around a cursor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutocompleteRequest {
    pub filename: String,
    pub before: String,
    pub after: String,
    pub region_includes_beginning: bool,
    pub region_includes_end: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_num_results: Option<u32>,
}

impl AutocompleteRequest {
    /// Build a query from a whole buffer and a byte offset.
    ///
    /// At most [`CONTEXT_CHAR_LIMIT`] characters are taken on each side.
    /// `region_includes_beginning` is set when the window starts at the
    /// buffer's first character. `region_includes_end` is set only when fewer
    /// than [`CONTEXT_CHAR_LIMIT`] characters follow the cursor, so a tail of
    /// exactly the limit reports `false` even though it is sent whole.
    /// An offset past the end or inside a character is moved back to the
    /// nearest character boundary.
    pub fn from_buffer(filename: impl Into<String>, text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let (head, tail) = text.split_at(offset);

        let before_start = head
            .char_indices()
            .rev()
            .nth(CONTEXT_CHAR_LIMIT - 1)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let after_end = tail
            .char_indices()
            .nth(CONTEXT_CHAR_LIMIT)
            .map(|(idx, _)| idx);

        Self {
            filename: filename.into(),
            before: head[before_start..].to_string(),
            after: tail[..after_end.unwrap_or(tail.len())].to_string(),
            region_includes_beginning: before_start == 0,
            region_includes_end: tail.char_indices().nth(CONTEXT_CHAR_LIMIT - 1).is_none(),
            max_num_results: Some(DEFAULT_MAX_RESULTS),
        }
    }

    /// The query answered with the engine's configuration directory
    pub fn config_dir() -> Self {
        Self {
            filename: "1".to_string(),
            before: CONFIG_DIR_QUERY.to_string(),
            after: "\n".to_string(),
            region_includes_beginning: true,
            region_includes_end: true,
            max_num_results: Some(DEFAULT_MAX_RESULTS),
        }
    }

    pub fn max_num_results(mut self, max: u32) -> Self {
        self.max_num_results = Some(max);
        self
    }
}

/// Completion reply
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AutocompleteResponse {
    #[serde(default)]
    pub old_prefix: String,
    #[serde(default)]
    pub results: Vec<ResultEntry>,
    #[serde(default)]
    pub user_message: Vec<String>,
}

impl AutocompleteResponse {
    /// Engine messages joined one per line
    pub fn detail_message(&self) -> String {
        self.user_message.join("\n")
    }
}

/// One suggestion
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultEntry {
    pub new_prefix: String,
    #[serde(default)]
    pub old_suffix: String,
    #[serde(default)]
    pub new_suffix: String,
    /// LSP completion item kind
    #[serde(default)]
    pub kind: Option<u32>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub documentation: Option<Documentation>,
    #[serde(default)]
    pub deprecated: Option<bool>,
}

impl ResultEntry {
    /// Text shown for the suggestion
    pub fn label(&self) -> String {
        format!("{}{}", self.new_prefix, self.new_suffix)
    }
}

/// Plain or marked-up documentation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Documentation {
    Plain(String),
    Markup { kind: String, value: String },
}

impl Documentation {
    pub fn value(&self) -> &str {
        match self {
            Documentation::Plain(s) => s,
            Documentation::Markup { value, .. } => value,
        }
    }

    pub fn is_markdown(&self) -> bool {
        matches!(self, Documentation::Markup { kind, .. } if kind == "markdown")
    }
}
