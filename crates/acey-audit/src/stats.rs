//! Read-only summaries of the log.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::AuditEvent;
use crate::mode::AuditMode;

/// Counts and flags describing the current log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStatistics {
    /// Retained events.
    pub total_events: usize,
    /// Retained events per type.
    pub by_type: BTreeMap<String, usize>,
    /// Retained events per level.
    pub by_level: BTreeMap<String, usize>,
    /// Events with a sealed payload.
    pub encrypted_events: usize,
    /// Events carrying a signature.
    pub signed_events: usize,
    /// Events recorded while blocked by incident mode.
    pub blocked_events: usize,
    /// Current mode.
    pub mode: AuditMode,
    /// Skills currently disabled.
    pub disabled_skills: Vec<String>,
    /// Result of the integrity check.
    pub chain_valid: bool,
    /// Events dropped by retention.
    pub trimmed_events: u64,
}

impl AuditStatistics {
    /// Tally `events` and attach the given log-wide facts.
    #[must_use]
    pub fn collect(
        events: &[AuditEvent],
        mode: AuditMode,
        disabled_skills: Vec<String>,
        chain_valid: bool,
        trimmed_events: u64,
    ) -> Self {
        let mut stats = Self {
            total_events: events.len(),
            by_type: BTreeMap::new(),
            by_level: BTreeMap::new(),
            encrypted_events: 0,
            signed_events: 0,
            blocked_events: 0,
            mode,
            disabled_skills,
            chain_valid,
            trimmed_events,
        };

        for event in events {
            bump(stats.by_type.entry(event.event_type.clone()).or_default());
            bump(stats.by_level.entry(event.level.as_str().to_owned()).or_default());
            if event.encrypted {
                bump(&mut stats.encrypted_events);
            }
            if event.is_signed() {
                bump(&mut stats.signed_events);
            }
            if event.blocked {
                bump(&mut stats.blocked_events);
            }
        }

        stats
    }
}

fn bump(counter: &mut usize) {
    *counter = counter.saturating_add(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::HashChain;
    use crate::event::{EventDraft, EventLevel, EventPayload};
    use serde_json::json;

    #[test]
    fn test_collect_counts() {
        let mut chain = HashChain::new();
        for (event_type, level) in [
            ("user_login", EventLevel::Info),
            ("user_login", EventLevel::Info),
            ("skill_execution", EventLevel::Warning),
        ] {
            chain.append(EventDraft::new(event_type, EventPayload::plain(json!({})), level), None);
        }
        chain.append(
            EventDraft::new("system_change", EventPayload::plain(json!({})), EventLevel::Info)
                .blocked(),
            None,
        );

        let stats = AuditStatistics::collect(
            chain.events(),
            AuditMode::Incident,
            vec!["deploy".to_owned()],
            true,
            0,
        );

        assert_eq!(stats.total_events, 4);
        assert_eq!(stats.by_type["user_login"], 2);
        assert_eq!(stats.by_level["info"], 3);
        assert_eq!(stats.by_level["warning"], 1);
        assert_eq!(stats.blocked_events, 1);
        assert_eq!(stats.encrypted_events, 0);
        assert_eq!(stats.signed_events, 0);
    }

    #[test]
    fn test_wire_names() {
        let stats = AuditStatistics::collect(&[], AuditMode::Standard, Vec::new(), true, 7);
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["totalEvents"], 0);
        assert_eq!(value["chainValid"], true);
        assert_eq!(value["trimmedEvents"], 7);
        assert_eq!(value["mode"], "standard");
    }
}
