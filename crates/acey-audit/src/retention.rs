//! Retention policy.
//!
//! Trimming removes events from the front of the chain and re-anchors it, so
//! the retained suffix keeps verifying. The chain records each trim as an
//! event of its own, so a trim under the event cap frees a little headroom
//! instead of a single slot.

use std::fmt;
use std::str::FromStr;

use acey_crypto::KeyPair;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::HashChain;
use crate::error::AuditError;
use crate::mode::AuditMode;

/// How the retention window is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionStrategy {
    /// Keep at most one event per second of the window.
    #[default]
    EventCount,
    /// Drop events whose timestamp is older than the window.
    WallClock,
}

impl fmt::Display for RetentionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventCount => f.write_str("event_count"),
            Self::WallClock => f.write_str("wall_clock"),
        }
    }
}

impl FromStr for RetentionStrategy {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "event_count" => Ok(Self::EventCount),
            "wall_clock" => Ok(Self::WallClock),
            other => Err(AuditError::InvalidConfig {
                field: "retention_strategy".to_owned(),
                message: format!("unknown retention strategy '{other}'"),
            }),
        }
    }
}

/// Retention window and when it may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    window: Duration,
    strategy: RetentionStrategy,
    trim_in_compliance_modes: bool,
}

impl RetentionPolicy {
    /// A window of `days` days.
    #[must_use]
    pub fn days(days: u32, strategy: RetentionStrategy) -> Self {
        Self::from_window(
            Duration::try_days(i64::from(days)).unwrap_or(Duration::MAX),
            strategy,
        )
    }

    /// An arbitrary window.
    #[must_use]
    pub fn from_window(window: Duration, strategy: RetentionStrategy) -> Self {
        Self {
            window,
            strategy,
            trim_in_compliance_modes: false,
        }
    }

    /// Allow trimming in audit and incident modes.
    #[must_use]
    pub fn trim_in_compliance_modes(mut self, allowed: bool) -> Self {
        self.trim_in_compliance_modes = allowed;
        self
    }

    /// The configured window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// The configured strategy.
    #[must_use]
    pub fn strategy(&self) -> RetentionStrategy {
        self.strategy
    }

    /// Event cap under [`RetentionStrategy::EventCount`]: one per second of window.
    #[must_use]
    pub fn max_events(&self) -> usize {
        usize::try_from(self.window.num_seconds().max(0)).unwrap_or(usize::MAX)
    }

    /// Whether trimming is permitted in `mode`.
    #[must_use]
    pub fn permits(&self, mode: AuditMode) -> bool {
        !mode.is_compliance() || self.trim_in_compliance_modes
    }

    /// Trim `chain` as of now. Returns the number of events removed.
    pub fn apply(&self, chain: &mut HashChain, mode: AuditMode, signer: Option<&KeyPair>) -> usize {
        self.apply_at(chain, mode, signer, Utc::now())
    }

    /// Trim `chain` as of `now`. Returns the number of events removed.
    ///
    /// Under [`RetentionStrategy::EventCount`] the chain never holds more
    /// than [`RetentionPolicy::max_events`] events afterwards, trim record
    /// included.
    pub fn apply_at(
        &self,
        chain: &mut HashChain,
        mode: AuditMode,
        signer: Option<&KeyPair>,
        now: DateTime<Utc>,
    ) -> usize {
        if !self.permits(mode) {
            debug!(mode = %mode, "Retention skipped in compliance mode");
            return 0;
        }

        let stale = match self.strategy {
            RetentionStrategy::EventCount => {
                let cap = self.max_events().max(1);
                match chain.len().checked_sub(cap) {
                    Some(overflow) if overflow > 0 => {
                        overflow.saturating_add((cap / 10).max(1))
                    },
                    _ => 0,
                }
            },
            RetentionStrategy::WallClock => match now.checked_sub_signed(self.window) {
                Some(cutoff) => chain
                    .events()
                    .iter()
                    .take_while(|event| event.timestamp < cutoff)
                    .count(),
                None => 0,
            },
        };

        if stale == 0 {
            return 0;
        }
        debug!(stale, strategy = %self.strategy, "Retention window exceeded");
        chain.trim_front(stale, signer, now)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::days(30, RetentionStrategy::EventCount)
    }
}
