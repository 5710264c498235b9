//! Run command - collect, reconcile and export stale computer accounts

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use tracing::info;

use staleguard_connector_entra::EntraConnector;
use staleguard_connector_ldap::LdapConnector;
use staleguard_core::{run_reconciliation, PartitionFailure, RunOutcome, RunReport};

use crate::config::{AppConfig, Overrides, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use crate::error::CliResult;
use crate::export::{export_report, ExportedFiles};
use crate::logging;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML configuration file
    #[arg(long, short, env = ENV_CONFIG_PATH, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Days without a directory change before an account is a candidate
    #[arg(long)]
    pub stale_days: Option<u32>,

    /// Destination of the actionable export
    #[arg(long, short)]
    pub output: Option<String>,

    /// Destination of the debug export of every candidate
    #[arg(long, conflicts_with = "no_debug_output")]
    pub debug_output: Option<String>,

    /// Skip the debug export even if the configuration names one
    #[arg(long)]
    pub no_debug_output: bool,

    /// Log level directive, e.g. "debug" or "info,staleguard_connector_ldap=debug"
    #[arg(long)]
    pub log_level: Option<String>,
}

impl RunArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            stale_cutoff_days: self.stale_days,
            primary_export_destination: self.output.clone(),
            debug_export_destination: self.debug_output.clone(),
            disable_debug_export: self.no_debug_output,
            log_level: self.log_level.clone(),
        }
    }
}

/// Execute the run command
pub async fn execute(args: RunArgs) -> CliResult<()> {
    let mut config = AppConfig::load(&args.config)?;
    config.apply_overrides(&args.overrides());
    config.validate()?;

    logging::init_logging(&config.logging)?;

    let settings = config.reconcile_settings();
    let directory = LdapConnector::new(config.directory_config())?
        .with_partitions(settings.domain_partitions.iter().cloned());
    let devices = EntraConnector::new(config.entra_config()?, config.entra_credentials()?)?;

    info!(
        config = %args.config.display(),
        partitions = settings.domain_partitions.len(),
        stale_cutoff_days = settings.stale_cutoff_days,
        "Configuration loaded"
    );

    let outcome = run_reconciliation(&directory, &devices, &settings, Utc::now()).await?;

    match outcome {
        RunOutcome::NoCandidates {
            cutoff,
            failed_partitions,
        } => {
            println!("No stale computer accounts changed on or before {cutoff}.");
            print_failed_partitions(&failed_partitions);
            println!("No files were written.");
        }
        RunOutcome::Completed(report) => {
            let primary = config.primary_export_path();
            let debug = config.debug_export_path();
            let files = export_report(&report, &primary, debug.as_deref())?;
            print_summary(&report, &files);
        }
    }

    Ok(())
}

fn print_failed_partitions(failures: &[PartitionFailure]) {
    if failures.is_empty() {
        return;
    }

    println!("Failed partitions:     {}", failures.len());
    for failure in failures {
        println!("  - {}: {}", failure.partition, failure.error);
    }
}

fn print_summary(report: &RunReport, files: &ExportedFiles) {
    println!("Stale computer account reconciliation");
    println!();
    println!("Cutoff:                {}", report.cutoff);
    println!("Candidates:            {}", report.candidate_count);
    println!("Devices listed:        {}", report.device_count);
    println!("Active:                {}", report.active_count());
    println!("Not active/not found:  {}", report.actionable.len());
    if report.excluded_rows > 0 {
        println!("Excluded by path:      {}", report.excluded_rows);
    }
    if report.rejected_rows > 0 {
        println!("Rejected rows:         {}", report.rejected_rows);
    }
    print_failed_partitions(&report.failed_partitions);
    println!();
    println!(
        "Actionable export:     {} ({} rows)",
        files.primary.display(),
        files.primary_rows
    );
    if let Some(ref debug) = files.debug {
        println!(
            "Debug export:          {} ({} rows)",
            debug.display(),
            files.debug_rows
        );
    }
}
