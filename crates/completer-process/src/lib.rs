//! # completer-process
//!
//! **Purpose**: Supervision of the completion engine child process
//!
//! ## Features
//!
//! - **Line channel**: the engine's stdin/stdout as a duplex line stream
//! - **Exit watching**: a background task observes exit and reports it with the process generation
//! - **Restart budget**: monotonic spawn-attempt counter with a fixed ceiling
//! - **Non-blocking teardown**: kill is signalled, never awaited
//!
//! ## Usage
//!
//! ```rust,no_run
//! use completer_process::{BinarySource, ProcessSupervisor, SupervisorConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SupervisorConfig::new(BinarySource::Explicit("/opt/engine/TabNine".into()))
//!     .client_name("my-editor");
//! let mut supervisor = ProcessSupervisor::new(config)?;
//!
//! let channel = supervisor.ensure_alive().await?;
//! channel.send_line(r#"{"version":"2.0.0","request":{"Configuration":{}}}"#).await?;
//! let reply = channel.read_line().await?;
//! # let _ = reply;
//! supervisor.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod child;
pub mod config;
pub mod error;
pub mod state;
pub mod supervisor;

pub use child::{EngineChannel, ManagedChild};
pub use config::{BinarySource, ProcessConfig, SupervisorConfig, DEFAULT_CLIENT_NAME, DEFAULT_MAX_RESTARTS};
pub use error::{ProcessError, Result};
pub use state::{ProcessState, StateSnapshot};
pub use supervisor::{ProcessMonitor, ProcessSupervisor};
