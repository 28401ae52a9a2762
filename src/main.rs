use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shipyard::config::ShipyardToml;
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(version, about = "Backlog and release pipeline simulator")]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to shipyard.toml (defaults to ./shipyard.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a simulated sprint and ship it through the release pipeline
    Release {
        /// Run strategy: fail_fast or always_continue
        #[arg(short, long)]
        strategy: Option<String>,

        /// Step kinds to run (comma-separated), overriding the config
        #[arg(long, value_delimiter = ',')]
        steps: Option<Vec<String>>,

        /// Make this step kind fail during execution
        #[arg(long)]
        fail_step: Option<String>,

        /// Number of backlog items in the sprint
        #[arg(long, default_value = "3")]
        items: usize,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// List the available pipeline step kinds
    Steps,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default shipyard.toml file
    Init,
}

impl Cli {
    /// Location of the config file, whether or not it exists.
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Ok(std::env::current_dir()
                .context("Failed to get current directory")?
                .join(shipyard::config::CONFIG_FILE)),
        }
    }

    /// Load the effective configuration.
    ///
    /// An explicit `--config` must exist, except for the `config` commands,
    /// which report on a missing file themselves and `init` creates it.
    fn load_config(&self) -> Result<ShipyardToml> {
        let path = self.config_path()?;
        let required = self.config.is_some() && !matches!(self.command, Commands::Config { .. });
        let config = if required || path.exists() {
            ShipyardToml::load(&path)?
        } else {
            ShipyardToml::default()
        };
        Ok(config.with_env_overrides())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if cli.log_json {
        logging.json = true;
    }
    let _log_guard = shipyard::logging::init_logging(&logging)?;

    match &cli.command {
        Commands::Release {
            strategy,
            steps,
            fail_step,
            items,
            json,
        } => {
            let options = cmd::ReleaseOptions {
                strategy: strategy.clone(),
                steps: steps.clone(),
                fail_step: fail_step.clone(),
                items: *items,
                json: *json,
            };
            cmd::cmd_release(&config, options).await?;
        }
        Commands::Steps => cmd::cmd_steps(),
        Commands::Config { command } => {
            cmd::cmd_config(&cli.config_path()?, &config, command.clone())?
        }
    }

    Ok(())
}
