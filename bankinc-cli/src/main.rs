//! Main entry point for the BankInc command-line client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use shared::{client::BankClient, config::ClientConfig};
use std::path::PathBuf;
use tracing::debug;
use url::Url;

mod commands;
mod logging;

/// BankInc CLI
#[derive(Parser)]
#[command(name = "bankinc")]
#[command(about = "Command-line client for the BankInc card and transaction API", long_about = None)]
struct Cli {
    /// Path to the configuration file (optional)
    #[arg(
        long,
        short,
        global = true,
        help = "Path to the configuration file (e.g., bankinc.yaml or bankinc.json). If not provided, defaults will be used."
    )]
    config: Option<PathBuf>,

    /// Base URL of the BankInc API, overriding configuration
    #[arg(
        long,
        global = true,
        help = "Base URL of the BankInc API (e.g., http://localhost:8081). Overrides the configuration file and BANKINC_BASE_URL."
    )]
    base_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the BankInc CLI
#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login(commands::session::LoginArgs),

    /// Create an account and its default card
    Register(commands::session::RegisterArgs),

    /// Forget the stored session
    Logout,

    /// Restore the stored session and show where it lands
    Status,

    /// Generate, list, activate, block, recharge and inspect cards
    #[command(subcommand)]
    Cards(commands::cards::CardCommand),

    /// Make purchases and look up or annul transactions
    #[command(subcommand)]
    Tx(commands::transactions::TxCommand),

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(
            long,
            short,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: String,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json). Defaults to yaml.
        #[arg(
            long,
            short,
            help = "Format of the configuration file to generate (yaml or json). Defaults to yaml."
        )]
        format: Option<String>,
    },
}

/// Resolves configuration, installs logging and builds the client.
fn open_client(config_path: Option<PathBuf>, base_url: Option<Url>) -> Result<BankClient> {
    let config =
        ClientConfig::load_config(config_path, base_url).context("failed to load configuration")?;
    logging::initialize_tracing(&config.log_level);
    debug!(base_url = %config.base_url, "configuration resolved");
    commands::connect(&config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let (config, base_url) = (cli.config, cli.base_url);

    match cli.command {
        Commands::Login(args) => {
            commands::session::login(&open_client(config, base_url)?, args).await?;
        }
        Commands::Register(args) => {
            commands::session::register(&open_client(config, base_url)?, args).await?;
        }
        Commands::Logout => commands::session::logout(&open_client(config, base_url)?)?,
        Commands::Status => commands::session::status(&open_client(config, base_url)?).await?,
        Commands::Cards(command) => {
            commands::cards::run(&open_client(config, base_url)?, command).await?;
        }
        Commands::Tx(command) => {
            commands::transactions::run(&open_client(config, base_url)?, command).await?;
        }
        Commands::Completion { shell } => {
            let shell = shell
                .parse::<clap_complete::Shell>()
                .map_err(|err| anyhow::anyhow!("invalid shell type: {err}"))?;
            commands::completion::generate_completion(shell);
        }
        Commands::Config { format } => {
            let format = format.unwrap_or_else(|| "yaml".to_string());
            commands::config::generate_config(&format)?;
        }
    }

    Ok(())
}
