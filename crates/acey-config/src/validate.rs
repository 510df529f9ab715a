//! Post-load configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Largest accepted retention window (100 years).
const MAX_RETENTION_DAYS: u32 = 36_500;

/// Validate a loaded configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_audit(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_audit(config: &Config) -> ConfigResult<()> {
    let a = &config.audit;

    if !matches!(a.mode.as_str(), "standard" | "audit" | "incident") {
        return Err(invalid(
            "audit.mode",
            format!(
                "unsupported mode '{}'; expected one of: standard, audit, incident",
                a.mode
            ),
        ));
    }

    if a.retention_days == 0 || a.retention_days > MAX_RETENTION_DAYS {
        return Err(invalid(
            "audit.retention_days",
            format!("retention_days must be between 1 and {MAX_RETENTION_DAYS}"),
        ));
    }

    if !matches!(a.retention_strategy.as_str(), "event_count" | "wall_clock") {
        return Err(invalid(
            "audit.retention_strategy",
            "expected 'event_count' or 'wall_clock'",
        ));
    }

    if a.mode == "audit" {
        if a.encryption_key.as_deref().is_none_or(str::is_empty) {
            return Err(invalid(
                "audit.encryption_key",
                "audit mode requires an encryption key",
            ));
        }
        if a.signature_key.as_deref().is_none_or(str::is_empty) {
            return Err(invalid(
                "audit.signature_key",
                "audit mode requires a signature key",
            ));
        }
    }

    for (field, list) in [
        ("audit.sensitive_types", &a.sensitive_types),
        ("audit.write_capable_skills", &a.write_capable_skills),
        ("audit.risky_operations", &a.risky_operations),
    ] {
        if list.iter().any(|entry| entry.trim().is_empty()) {
            return Err(invalid(field, "entries must not be empty"));
        }
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !matches!(
        l.level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error" | "off"
    ) {
        return Err(invalid(
            "logging.level",
            format!("unknown level '{}'", l.level),
        ));
    }

    if !matches!(l.format.as_str(), "pretty" | "compact" | "json" | "full") {
        return Err(invalid(
            "logging.format",
            format!("unknown format '{}'", l.format),
        ));
    }

    Ok(())
}
