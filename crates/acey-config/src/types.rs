//! Configuration types for the audit ledger.
//!
//! These types have no dependency on the audit crate. Mode and strategy
//! names are kept as strings here and validated in [`crate::validate`];
//! conversion to domain types happens in `acey-audit`.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Audit logger settings.
    pub audit: AuditSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// AuditSection
// ---------------------------------------------------------------------------

/// Audit logger settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    /// Operating mode: `"standard"`, `"audit"` or `"incident"`.
    pub mode: String,
    /// Refuse `clear` and import-over-existing when set.
    pub immutable: bool,
    /// Retention window in days.
    pub retention_days: u32,
    /// `"event_count"` (one event per second of window) or `"wall_clock"`.
    pub retention_strategy: String,
    /// Allow retention trimming while in audit or incident mode.
    pub trim_in_compliance_modes: bool,
    /// Secret for payload encryption. Prefer `ACEY_AUDIT_ENCRYPTION_KEY`.
    pub encryption_key: Option<String>,
    /// Secret for event signing. Prefer `ACEY_AUDIT_SIGNATURE_KEY`.
    pub signature_key: Option<String>,
    /// Event types that are always encrypted in audit mode.
    pub sensitive_types: Vec<String>,
    /// Skills disabled while incident mode is active.
    pub write_capable_skills: Vec<String>,
    /// Event types flagged as blocked while incident mode is active.
    pub risky_operations: Vec<String>,
}

impl std::fmt::Debug for AuditSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditSection")
            .field("mode", &self.mode)
            .field("immutable", &self.immutable)
            .field("retention_days", &self.retention_days)
            .field("retention_strategy", &self.retention_strategy)
            .field("trim_in_compliance_modes", &self.trim_in_compliance_modes)
            .field("has_encryption_key", &self.encryption_key.is_some())
            .field("has_signature_key", &self.signature_key.is_some())
            .field("sensitive_types", &self.sensitive_types)
            .field("write_capable_skills", &self.write_capable_skills)
            .field("risky_operations", &self.risky_operations)
            .finish()
    }
}

impl Serialize for AuditSection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AuditSection", 8)?;
        state.serialize_field("mode", &self.mode)?;
        state.serialize_field("immutable", &self.immutable)?;
        state.serialize_field("retention_days", &self.retention_days)?;
        state.serialize_field("retention_strategy", &self.retention_strategy)?;
        state.serialize_field("trim_in_compliance_modes", &self.trim_in_compliance_modes)?;
        // Secrets are intentionally omitted.
        state.serialize_field("sensitive_types", &self.sensitive_types)?;
        state.serialize_field("write_capable_skills", &self.write_capable_skills)?;
        state.serialize_field("risky_operations", &self.risky_operations)?;
        state.end()
    }
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            mode: "standard".to_owned(),
            immutable: true,
            retention_days: 30,
            retention_strategy: "event_count".to_owned(),
            trim_in_compliance_modes: false,
            encryption_key: None,
            signature_key: None,
            sensitive_types: default_sensitive_types(),
            write_capable_skills: default_write_capable_skills(),
            risky_operations: default_risky_operations(),
        }
    }
}

/// Default sensitive event types.
#[must_use]
pub fn default_sensitive_types() -> Vec<String> {
    to_owned_list(&["user_data", "credentials", "api_keys", "personal_info"])
}

/// Default skills disabled in incident mode.
#[must_use]
pub fn default_write_capable_skills() -> Vec<String> {
    to_owned_list(&["file_write", "system_modify", "config_change", "deploy"])
}

/// Default event types intercepted in incident mode.
#[must_use]
pub fn default_risky_operations() -> Vec<String> {
    to_owned_list(&["skill_execution", "system_change", "config_update"])
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging settings consumed by the telemetry setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level filter (e.g. `"info"`).
    pub level: String,
    /// `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Extra directives such as `"acey_audit=debug"`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.audit.mode, "standard");
        assert_eq!(config.audit.retention_days, 30);
        assert!(config.audit.immutable);
        assert!(config.audit.sensitive_types.contains(&"credentials".to_owned()));
        assert!(
            config
                .audit
                .write_capable_skills
                .contains(&"system_modify".to_owned())
        );
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_secrets_not_serialized() {
        let section = AuditSection {
            encryption_key: Some("enc".to_owned()),
            signature_key: Some("sig".to_owned()),
            ..AuditSection::default()
        };
        let rendered = toml::to_string(&section).unwrap();
        assert!(!rendered.contains("encryption_key"));
        assert!(!rendered.contains("signature_key"));

        let debug = format!("{section:?}");
        assert!(debug.contains("has_signature_key: true"));
        assert!(!debug.contains("\"sig\""));
    }
}
