//! Verify command - check an export's chain integrity.

use std::path::Path;

use acey_audit::{ChainVerificationResult, ImportReport, LoggerConfig};
use serde_json::json;

use super::{OutputFormat, load_export, read_export};
use crate::theme::Theme;

/// Import `contents` and verify the resulting chain.
pub(crate) fn verify_export(
    contents: &str,
    config: LoggerConfig,
) -> anyhow::Result<(ImportReport, ChainVerificationResult)> {
    let (logger, report) = load_export(contents, config)?;
    let result = logger.verify_chain()?;
    Ok((report, result))
}

/// Verify the export at `path` and print the findings. Returns whether the chain is valid.
pub(crate) fn run(path: &Path, config: LoggerConfig, format: OutputFormat) -> anyhow::Result<bool> {
    let contents = read_export(path)?;
    let has_key = config.signature_key.is_some();
    let (report, result) = verify_export(&contents, config)?;

    match format {
        OutputFormat::Json => {
            let output = json!({ "import": report, "verification": result });
            println!("{}", serde_json::to_string_pretty(&output)?);
        },
        OutputFormat::Pretty => print_pretty(path, &report, &result, has_key),
    }

    Ok(result.valid)
}

fn print_pretty(path: &Path, report: &ImportReport, result: &ChainVerificationResult, has_key: bool) {
    println!("\n{}", Theme::header("Audit Chain Verification"));
    println!("{}", Theme::separator());
    println!("{}", Theme::field("Export", &path.display().to_string()));
    println!(
        "{}",
        Theme::field("Entries verified", &result.entries_verified.to_string())
    );
    let source = match report.source_verified {
        Some(true) => "valid",
        Some(false) => "INVALID",
        None => "not recorded",
    };
    println!("{}", Theme::field("Source verdict", source));
    println!();

    if result.unverified_signatures > 0 {
        let hint = if has_key {
            ""
        } else {
            " (pass --signature-key to check them)"
        };
        println!(
            "{}",
            Theme::warning(&format!(
                "{} signatures not checked{hint}",
                result.unverified_signatures
            ))
        );
    }

    if result.valid {
        println!(
            "{}",
            Theme::success(&format!(
                "Chain verified: {} entries, no issues",
                result.entries_verified
            ))
        );
    } else {
        println!(
            "{}",
            Theme::error(&format!("Chain has {} issues:", result.issues.len()))
        );
        for issue in &result.issues {
            println!("  - {issue}");
        }
    }
    println!();
}
