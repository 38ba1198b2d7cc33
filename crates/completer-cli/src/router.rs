// Command routing and dispatch

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use completer_client::{CompleterConfig, EngineClient, DEFAULT_MAX_RESULTS};
use tracing::debug;

use crate::commands::*;
use crate::error::{CliError, CliResult};

/// completer - install, update and query a line-JSON completion engine
#[derive(Parser, Debug)]
#[command(name = "completer")]
#[command(bin_name = "completer")]
#[command(about = "Install, update and query the completion engine")]
#[command(version)]
#[command(author = "Completer Contributors")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <config_dir>/completer/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Download the latest engine unless one is installed
    Install,

    /// Install the latest engine version
    Update {
        /// Reinstall even if the latest version is present
        #[arg(short, long)]
        force: bool,
    },

    /// Show which engine binary would be launched
    Which,

    /// Send a raw JSON request and print the reply
    Request {
        /// Request payload, wrapped as {"version": ..., "request": <JSON>}
        #[arg(value_name = "JSON")]
        payload: String,

        /// Protocol version tag (default: configured protocol_version)
        #[arg(long)]
        version: Option<String>,
    },

    /// Complete at a byte offset in a file
    Complete {
        #[arg(short, long, value_name = "PATH")]
        file: PathBuf,

        /// Byte offset of the cursor (default: end of file)
        #[arg(short, long)]
        offset: Option<usize>,

        /// Maximum number of results
        #[arg(short, long, default_value_t = DEFAULT_MAX_RESULTS)]
        limit: u32,
    },

    /// Print the engine's configuration directory
    ConfigDir {
        /// Print the engine settings file instead of the directory
        #[arg(long)]
        file: bool,

        /// Also ask the engine to open its configuration hub
        #[arg(long)]
        hub: bool,
    },
}

/// Command router
pub struct CommandRouter;

impl CommandRouter {
    /// Parse arguments, set up logging and run the command
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();

        let level = crate::logging::level_for(cli.verbose, cli.quiet, cli.log_level.as_deref());
        crate::logging::init_logging(level);

        Self::execute(&cli).await
    }

    /// Execute a parsed command line
    pub async fn execute(cli: &Cli) -> CliResult<()> {
        let config = load_config(cli.config.as_deref())?;
        debug!(storage = %config.storage_path.display(), "Configuration loaded");
        let client = EngineClient::new(config)?;

        let command: Box<dyn Command> = match &cli.command {
            Commands::Install => Box::new(InstallCommand::new(cli.quiet)),
            Commands::Update { force } => Box::new(UpdateCommand::new(*force, cli.quiet)),
            Commands::Which => Box::new(WhichCommand),
            Commands::Request { payload, version } => {
                Box::new(RequestCommand::new(payload.clone(), version.clone()))
            }
            Commands::Complete {
                file,
                offset,
                limit,
            } => Box::new(CompleteCommand::new(file.clone(), *offset, *limit)),
            Commands::ConfigDir { file, hub } => Box::new(ConfigDirCommand::new(*file, *hub)),
        };

        command.execute(&client).await
    }
}

fn load_config(path: Option<&Path>) -> CliResult<CompleterConfig> {
    let loaded = match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            CompleterConfig::load_from(path)
        }
        None => CompleterConfig::load(),
    };
    Ok(loaded?)
}
