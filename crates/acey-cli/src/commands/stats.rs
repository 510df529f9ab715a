//! Stats command - summarise an export.

use std::path::Path;

use acey_audit::{AuditStatistics, ExportDocument, LoggerConfig};
use tracing::debug;

use super::{load_export, read_export};

/// Import `contents` and summarise it.
///
/// The export is inspected in the mode it was exported in, falling back to
/// standard mode when that mode needs keys that are not configured.
pub(crate) fn collect(contents: &str, config: LoggerConfig) -> anyhow::Result<AuditStatistics> {
    let mode = ExportDocument::parse(contents)
        .map_err(|errors| anyhow::anyhow!("import failed: {}", errors.join("; ")))?
        .metadata
        .mode;

    let (logger, _) = match load_export(contents, config.clone().with_mode(mode)) {
        Ok(loaded) => loaded,
        Err(e) => {
            debug!(mode = %mode, error = %e, "Inspecting export in standard mode");
            load_export(contents, config)?
        },
    };

    let mut stats = logger.statistics()?;
    stats.mode = mode;
    Ok(stats)
}

/// Print statistics for the export at `path` as JSON.
pub(crate) fn run(path: &Path, config: LoggerConfig) -> anyhow::Result<()> {
    let contents = read_export(path)?;
    let stats = collect(&contents, config)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::signed_export;
    use acey_audit::{AuditMode, EnterpriseAuditLogger, EventLevel};
    use serde_json::json;

    fn inspector() -> LoggerConfig {
        LoggerConfig::standard().with_immutable(false)
    }

    #[test]
    fn test_collect_counts() {
        let stats = collect(&signed_export("sig"), inspector()).unwrap();

        assert_eq!(stats.total_events, 5);
        assert_eq!(stats.signed_events, 3);
        assert_eq!(stats.blocked_events, 1);
        assert_eq!(stats.by_type["risky_operation_blocked"], 1);
        assert_eq!(stats.mode, AuditMode::Standard);
        assert!(stats.chain_valid);
    }

    #[test]
    fn test_incident_export_reports_disabled_skills() {
        let log = EnterpriseAuditLogger::incident();
        log.log("user_login", json!({}), EventLevel::Info).unwrap();
        let export = log.export_json(false).unwrap();

        let stats = collect(&export, inspector()).unwrap();
        assert_eq!(stats.mode, AuditMode::Incident);
        assert!(stats.disabled_skills.contains(&"deploy".to_owned()));
    }

    #[test]
    fn test_audit_export_without_keys_falls_back() {
        let log = EnterpriseAuditLogger::audit("enc", "sig").unwrap();
        log.log("credentials", json!({"token": "x"}), EventLevel::Info)
            .unwrap();
        let export = log.export_json(false).unwrap();

        let stats = collect(&export, inspector()).unwrap();
        assert_eq!(stats.mode, AuditMode::Audit);
        assert_eq!(stats.encrypted_events, 1);
        assert!(stats.chain_valid);
    }

    #[test]
    fn test_collect_rejects_garbage() {
        assert!(collect("[]", inspector()).is_err());
    }
}
