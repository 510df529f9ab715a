//! Acey Audit CLI - inspect and verify audit log exports.
//!
//! The CLI never writes to a live log. It imports an export into a
//! throwaway logger and reports on what it finds.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod config_bridge;
mod theme;

use commands::{OutputFormat, keygen, stats, verify};
use theme::Theme;

/// Acey Audit - immutable audit ledger tools
#[derive(Parser)]
#[command(name = "acey-audit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the hash chain of an export (exit code 1 if invalid)
    Verify {
        /// Export produced by `export_json`
        path: PathBuf,

        /// Signing secret used to check signatures
        #[arg(long, env = "ACEY_AUDIT_SIGNATURE_KEY", hide_env_values = true)]
        signature_key: Option<String>,
    },

    /// Print statistics for an export as JSON
    Stats {
        /// Export produced by `export_json`
        path: PathBuf,
    },

    /// Generate a signing key
    Keygen,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", Theme::error(&format!("{e:#}")));
            ExitCode::from(2)
        },
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = config_bridge::load(cli.config.as_deref())?;

    let log_config = config_bridge::to_log_config(&config, cli.verbose);
    if let Err(e) = acey_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Verify {
            path,
            signature_key,
        } => {
            let logger_config = config_bridge::inspector_config(&config, signature_key.as_deref())?;
            let valid = verify::run(&path, logger_config, cli.format)?;
            Ok(if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        },
        Commands::Stats { path } => {
            let logger_config = config_bridge::inspector_config(&config, None)?;
            stats::run(&path, logger_config)?;
            Ok(ExitCode::SUCCESS)
        },
        Commands::Keygen => {
            keygen::run(cli.format)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}
