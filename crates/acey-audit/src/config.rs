//! Logger configuration and its conversion from the config file section.

use acey_config::AuditSection;
use chrono::Duration;

use crate::error::AuditResult;
use crate::mode::AuditMode;
use crate::retention::{RetentionPolicy, RetentionStrategy};

/// Retention for the standard preset.
pub const STANDARD_RETENTION_DAYS: u32 = 30;
/// Retention for the audit preset (seven years).
pub const AUDIT_RETENTION_DAYS: u32 = 2555;
/// Retention for the incident preset.
pub const INCIDENT_RETENTION_DAYS: u32 = 36_500;

/// Event-type and skill catalogues driving classification and gating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalogues {
    /// Event types sealed in audit mode regardless of level.
    pub sensitive_types: Vec<String>,
    /// Skills disabled while incident mode is active.
    pub write_capable_skills: Vec<String>,
    /// Event types intercepted while incident mode is active.
    pub risky_operations: Vec<String>,
}

impl Default for Catalogues {
    fn default() -> Self {
        Self {
            sensitive_types: acey_config::default_sensitive_types(),
            write_capable_skills: acey_config::default_write_capable_skills(),
            risky_operations: acey_config::default_risky_operations(),
        }
    }
}

/// Construction parameters for [`EnterpriseAuditLogger`](crate::EnterpriseAuditLogger).
#[derive(Clone)]
pub struct LoggerConfig {
    /// Initial mode.
    pub mode: AuditMode,
    /// Refuse `clear` and import into a non-empty log.
    pub immutable: bool,
    /// Retention window in days.
    pub retention_days: u32,
    /// How the window is measured.
    pub retention_strategy: RetentionStrategy,
    /// Allow trimming in audit and incident modes.
    pub trim_in_compliance_modes: bool,
    /// Overrides `retention_days` with a finer-grained window.
    pub retention_window: Option<Duration>,
    /// Secret for payload encryption.
    pub encryption_key: Option<String>,
    /// Secret for event signing.
    pub signature_key: Option<String>,
    /// Classification and gating catalogues.
    pub catalogues: Catalogues,
}

impl LoggerConfig {
    /// Standard mode, 30-day retention, no secrets.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            mode: AuditMode::Standard,
            immutable: true,
            retention_days: STANDARD_RETENTION_DAYS,
            retention_strategy: RetentionStrategy::EventCount,
            trim_in_compliance_modes: false,
            retention_window: None,
            encryption_key: None,
            signature_key: None,
            catalogues: Catalogues::default(),
        }
    }

    /// Audit mode with both secrets and seven-year retention.
    #[must_use]
    pub fn audit(encryption_key: impl Into<String>, signature_key: impl Into<String>) -> Self {
        Self {
            mode: AuditMode::Audit,
            retention_days: AUDIT_RETENTION_DAYS,
            encryption_key: Some(encryption_key.into()),
            signature_key: Some(signature_key.into()),
            ..Self::standard()
        }
    }

    /// Incident mode with century-long retention and no secrets.
    #[must_use]
    pub fn incident() -> Self {
        Self {
            mode: AuditMode::Incident,
            retention_days: INCIDENT_RETENTION_DAYS,
            ..Self::standard()
        }
    }

    /// Convert a validated `[audit]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidConfig`](crate::AuditError::InvalidConfig)
    /// if the mode or retention strategy name is unknown.
    pub fn from_section(section: &AuditSection) -> AuditResult<Self> {
        Ok(Self {
            mode: section.mode.parse()?,
            immutable: section.immutable,
            retention_days: section.retention_days,
            retention_strategy: section.retention_strategy.parse()?,
            trim_in_compliance_modes: section.trim_in_compliance_modes,
            retention_window: None,
            encryption_key: non_empty(section.encryption_key.as_deref()),
            signature_key: non_empty(section.signature_key.as_deref()),
            catalogues: Catalogues {
                sensitive_types: section.sensitive_types.clone(),
                write_capable_skills: section.write_capable_skills.clone(),
                risky_operations: section.risky_operations.clone(),
            },
        })
    }

    /// Set the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: AuditMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the immutability flag.
    #[must_use]
    pub fn with_immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    /// Set the signing secret.
    #[must_use]
    pub fn with_signature_key(mut self, secret: impl Into<String>) -> Self {
        self.signature_key = Some(secret.into());
        self
    }

    /// Set the encryption secret.
    #[must_use]
    pub fn with_encryption_key(mut self, secret: impl Into<String>) -> Self {
        self.encryption_key = Some(secret.into());
        self
    }

    /// Use an explicit retention window instead of whole days.
    #[must_use]
    pub fn with_retention_window(mut self, window: Duration, strategy: RetentionStrategy) -> Self {
        self.retention_window = Some(window);
        self.retention_strategy = strategy;
        self
    }

    /// Allow trimming in audit and incident modes.
    #[must_use]
    pub fn with_trim_in_compliance_modes(mut self, allowed: bool) -> Self {
        self.trim_in_compliance_modes = allowed;
        self
    }

    /// The retention policy these settings describe.
    #[must_use]
    pub fn retention_policy(&self) -> RetentionPolicy {
        let policy = match self.retention_window {
            Some(window) => RetentionPolicy::from_window(window, self.retention_strategy),
            None => RetentionPolicy::days(self.retention_days, self.retention_strategy),
        };
        policy.trim_in_compliance_modes(self.trim_in_compliance_modes)
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("mode", &self.mode)
            .field("immutable", &self.immutable)
            .field("retention_days", &self.retention_days)
            .field("retention_strategy", &self.retention_strategy)
            .field("trim_in_compliance_modes", &self.trim_in_compliance_modes)
            .field("retention_window", &self.retention_window)
            .field("has_encryption_key", &self.encryption_key.is_some())
            .field("has_signature_key", &self.signature_key.is_some())
            .field("catalogues", &self.catalogues)
            .finish()
    }
}

fn non_empty(secret: Option<&str>) -> Option<String> {
    secret
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned)
}
