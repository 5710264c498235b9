//! staleguard - stale computer account reconciliation
//!
//! Finds Active Directory computer accounts that have not changed within the
//! configured window and have no recent sign-in in Entra ID, and exports them
//! for decommissioning review.

use clap::{Parser, Subcommand};

use staleguard_cli::commands;
use staleguard_cli::error::CliResult;

/// staleguard - stale computer account reconciliation
#[derive(Parser)]
#[command(name = "staleguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect, reconcile and export stale computer accounts
    Run(commands::run::RunArgs),

    /// Load and validate a configuration file without contacting any service
    ValidateConfig(commands::validate::ValidateArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::ValidateConfig(args) => commands::validate::execute(args),
    }
}
