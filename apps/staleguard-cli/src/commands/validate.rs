//! Validate-config command - check a configuration file offline

use std::path::PathBuf;

use clap::Args;

use crate::config::{AppConfig, DEFAULT_CONFIG_PATH, ENV_CLIENT_SECRET, ENV_CONFIG_PATH};
use crate::error::CliResult;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the YAML configuration file
    #[arg(long, short, env = ENV_CONFIG_PATH, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

/// Execute the validate-config command
pub fn execute(args: ValidateArgs) -> CliResult<()> {
    let config = AppConfig::load(&args.config)?;
    config.validate()?;

    let settings = config.reconcile_settings();

    println!("{} is valid", args.config.display());
    println!();
    println!("Tenant:                {}", config.tenant_id);
    println!("Cloud:                 {:?}", config.entra.cloud);
    println!("Stale cutoff (days):   {}", settings.stale_cutoff_days);
    println!(
        "Partitions:            {}",
        settings.domain_partitions.join(", ")
    );
    if let Some(ref scope) = settings.scope_restriction {
        println!("Search root:           {scope}");
    }
    if !settings.exclusions.is_empty() {
        println!(
            "Excluded paths:        {}",
            settings.exclusions.substrings().join(", ")
        );
    }
    println!(
        "Actionable export:     {}",
        config.primary_export_path().display()
    );
    match config.debug_export_path() {
        Some(path) => println!("Debug export:          {}", path.display()),
        None => println!("Debug export:          disabled"),
    }

    if !config.has_client_secret() {
        println!();
        println!("warning: {ENV_CLIENT_SECRET} is not set; `staleguard run` will fail");
    }

    Ok(())
}
