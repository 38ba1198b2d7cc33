//! completer CLI library
//!
//! The `completer` binary is a thin wrapper around [`router::CommandRouter`].

pub mod commands;
pub mod error;
pub mod logging;
pub mod progress;
pub mod router;

pub use error::{CliError, CliResult};
pub use router::{Cli, CommandRouter, Commands};
