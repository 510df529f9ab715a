//! Operating modes and incident-mode gating.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// Logger operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditMode {
    /// Plain hash chaining.
    #[default]
    Standard,
    /// Signing and sensitive-payload encryption, both keys required.
    Audit,
    /// Write-capable skills disabled, risky operations flagged.
    Incident,
}

impl AuditMode {
    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Audit => "audit",
            Self::Incident => "incident",
        }
    }

    /// Whether every event must be signed.
    #[must_use]
    pub fn requires_signing(self) -> bool {
        matches!(self, Self::Audit)
    }

    /// Whether sensitive payloads are sealed.
    #[must_use]
    pub fn encrypts_sensitive(self) -> bool {
        matches!(self, Self::Audit)
    }

    /// Whether write-capable skills are gated and risky operations intercepted.
    #[must_use]
    pub fn gates_skills(self) -> bool {
        matches!(self, Self::Incident)
    }

    /// Audit and incident modes, where retention trimming is off by default.
    #[must_use]
    pub fn is_compliance(self) -> bool {
        matches!(self, Self::Audit | Self::Incident)
    }
}

impl fmt::Display for AuditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditMode {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "audit" => Ok(Self::Audit),
            "incident" => Ok(Self::Incident),
            other => Err(AuditError::InvalidConfig {
                field: "mode".to_owned(),
                message: format!("unknown audit mode '{other}'"),
            }),
        }
    }
}

/// Outcome of classifying an event against incident gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    /// Record normally.
    Allowed,
    /// Record with `blocked = true` and follow up with a block notice.
    Blocked,
}

/// What changed when the mode moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeTransition {
    /// Mode before the change.
    pub from: AuditMode,
    /// Mode after the change.
    pub to: AuditMode,
    /// Skills disabled by entering incident mode (sorted).
    pub disabled: Vec<String>,
    /// Skills re-enabled by leaving incident mode (sorted).
    pub reenabled: Vec<String>,
}

impl ModeTransition {
    /// Whether this transition entered incident mode.
    #[must_use]
    pub fn entered_incident(&self) -> bool {
        self.to == AuditMode::Incident && self.from != AuditMode::Incident
    }

    /// Whether this transition left incident mode.
    #[must_use]
    pub fn left_incident(&self) -> bool {
        self.from == AuditMode::Incident && self.to != AuditMode::Incident
    }
}

/// Tracks the current mode and the skills it disables.
#[derive(Debug, Clone)]
pub struct ModeController {
    mode: AuditMode,
    disabled: BTreeSet<String>,
    write_capable: BTreeSet<String>,
    risky: BTreeSet<String>,
}

impl ModeController {
    /// Create a controller in `mode`.
    ///
    /// Starting in incident mode disables the write-capable skills at once.
    #[must_use]
    pub fn new(
        mode: AuditMode,
        write_capable: impl IntoIterator<Item = String>,
        risky: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut controller = Self {
            mode,
            disabled: BTreeSet::new(),
            write_capable: write_capable.into_iter().collect(),
            risky: risky.into_iter().collect(),
        };
        if mode.gates_skills() {
            controller.disabled = controller.write_capable.clone();
        }
        controller
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> AuditMode {
        self.mode
    }

    /// Whether a skill may run. Always true outside incident mode.
    #[must_use]
    pub fn is_skill_allowed(&self, skill_id: &str) -> bool {
        !self.mode.gates_skills() || !self.disabled.contains(skill_id)
    }

    /// Sorted snapshot of the disabled skills.
    #[must_use]
    pub fn disabled_skills(&self) -> Vec<String> {
        self.disabled.iter().cloned().collect()
    }

    /// Classify an event type against incident gating.
    #[must_use]
    pub fn intercept(&self, event_type: &str) -> Interception {
        if self.mode.gates_skills() && self.risky.contains(event_type) {
            Interception::Blocked
        } else {
            Interception::Allowed
        }
    }

    /// Move to `to`. Returns `None` when already there.
    pub fn transition(&mut self, to: AuditMode) -> Option<ModeTransition> {
        let from = self.mode;
        if from == to {
            return None;
        }

        let mut transition = ModeTransition {
            from,
            to,
            disabled: Vec::new(),
            reenabled: Vec::new(),
        };

        if to.gates_skills() {
            self.disabled = self.write_capable.clone();
            transition.disabled = self.disabled_skills();
        } else if from.gates_skills() {
            transition.reenabled = self.disabled_skills();
            self.disabled.clear();
        }

        self.mode = to;
        Some(transition)
    }
}
