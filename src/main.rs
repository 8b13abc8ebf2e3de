use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ratewatch::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for ratewatch::AppCommand {
    fn from(cmd: Commands) -> ratewatch::AppCommand {
        match cmd {
            Commands::Watch => ratewatch::AppCommand::Watch,
            Commands::Check => ratewatch::AppCommand::Check,
            Commands::Status => ratewatch::AppCommand::Status,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Poll the exchange rate on the configured schedule until interrupted
    Watch,
    /// Run a single check now
    Check,
    /// Show the stored notification state
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => ratewatch::cli::setup::setup(),
        Some(cmd) => ratewatch::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
