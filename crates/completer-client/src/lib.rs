//! Client for a line-JSON completion engine process
//!
//! ## Features
//!
//! - **Single in-flight request**: one lock covers write, read and parse
//! - **Cancellation with drain**: abandoned requests still consume their reply
//! - **Typed helpers**: autocomplete, config directory lookup, configuration hub
//! - **Provisioning**: installs the engine on first use through [`completer_install`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use completer_client::{AutocompleteRequest, CompleterConfig, EngineClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EngineClient::new(CompleterConfig::load()?)?;
//! client.ensure_installed(None).await?;
//!
//! let request = AutocompleteRequest::from_buffer("main.rs", "fn ma", 5);
//! let response = client.autocomplete(request).await?;
//! for entry in &response.results {
//!     println!("{}", entry.label());
//! }
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;

pub use broker::{RequestBroker, DEFAULT_REPLY_DEADLINE, DEFAULT_REQUEST_TIMEOUT};
pub use client::{EngineClient, ENGINE_CONFIG_FILE};
pub use config::{CompleterConfig, ENV_PREFIX};
pub use error::{ClientError, Result};
pub use protocol::{
    decode_response, encode_request, AutocompleteRequest, AutocompleteResponse,
    ConfigurationRequest, Documentation, EngineRequest, ResultEntry, CONFIG_DIR_QUERY,
    CONTEXT_CHAR_LIMIT, DEFAULT_MAX_RESULTS, DEFAULT_PROTOCOL_VERSION,
};
