//! Subcommand implementations.

pub(crate) mod keygen;
pub(crate) mod stats;
pub(crate) mod verify;

use std::path::Path;

use acey_audit::{EnterpriseAuditLogger, ImportReport, LoggerConfig};
use anyhow::Context;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

/// Read an export file.
pub(crate) fn read_export(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

/// Import an export into a fresh logger built from `config`.
pub(crate) fn load_export(
    contents: &str,
    config: LoggerConfig,
) -> anyhow::Result<(EnterpriseAuditLogger, ImportReport)> {
    let logger = EnterpriseAuditLogger::new(config)?;
    let report = logger.import(contents);
    if !report.success {
        anyhow::bail!("import failed: {}", report.errors.join("; "));
    }
    Ok((logger, report))
}
