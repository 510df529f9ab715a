//! Hash-chain engine.
//!
//! Owns the ordered event list and the chain pointers. It stamps sequence
//! numbers, hashes and signatures on append and checks them on
//! verification. Policy (modes, sealing, retention limits) lives elsewhere;
//! the chain only knows how to link, verify and trim.
//!
//! Every trim appends a `retention_trimmed` record naming the new anchor and
//! the running trimmed count. A non-genesis anchor is only accepted when the
//! newest retained record vouches for it.

use acey_crypto::{ChainHash, KeyPair, PublicKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::event::{AuditEvent, EventDraft, EventId, EventLevel, EventPayload};

/// Event recorded by the chain each time events are trimmed from the front.
pub const RETENTION_TRIMMED: &str = "retention_trimmed";

/// Payload of a [`RETENTION_TRIMMED`] event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrimRecord {
    previous_anchor: ChainHash,
    anchor_hash: ChainHash,
    removed: u64,
    trimmed_count: u64,
}

impl TrimRecord {
    fn from_event(event: &AuditEvent) -> Option<Self> {
        if event.event_type != RETENTION_TRIMMED {
            return None;
        }
        event
            .data
            .as_plain()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Chain pointers that must survive export and import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainState {
    /// Sequence the next appended event will carry.
    pub next_sequence: u64,
    /// Hash of the newest event, or the anchor when empty.
    pub last_hash: ChainHash,
    /// `previous_hash` expected of the oldest retained event.
    pub anchor_hash: ChainHash,
    /// Number of events dropped from the front.
    pub trimmed_count: u64,
}

/// Append-only, hash-linked sequence of audit events.
#[derive(Debug, Default)]
pub struct HashChain {
    events: Vec<AuditEvent>,
    state: ChainState,
}

impl HashChain {
    /// Create an empty chain anchored at the sentinel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a chain from imported events and pointers.
    ///
    /// Nothing is verified here; callers run [`HashChain::verify`] after.
    #[must_use]
    pub fn restore(events: Vec<AuditEvent>, state: ChainState) -> Self {
        Self { events, state }
    }

    /// Append a draft, stamping sequence, hashes and an optional signature.
    pub fn append(&mut self, draft: EventDraft, signer: Option<&KeyPair>) -> AuditEvent {
        self.append_at(draft, signer, Utc::now())
    }

    /// Append with an explicit timestamp.
    pub fn append_at(
        &mut self,
        draft: EventDraft,
        signer: Option<&KeyPair>,
        timestamp: DateTime<Utc>,
    ) -> AuditEvent {
        let sequence = self.state.next_sequence;
        let mut event = AuditEvent::from_draft(draft, timestamp, sequence, self.state.last_hash);
        if let Some(keypair) = signer {
            event.signature = Some(keypair.sign(event.hash.as_bytes()));
        }

        debug!(
            entry_id = %event.id,
            sequence,
            event_type = %event.event_type,
            level = %event.level,
            signed = event.is_signed(),
            encrypted = event.encrypted,
            "Appending audit event"
        );

        self.state.last_hash = event.hash;
        self.state.next_sequence = sequence.saturating_add(1);
        self.events.push(event.clone());
        event
    }

    /// All retained events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Current chain pointers.
    #[must_use]
    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Check one event as if it sat at `index` of this chain.
    ///
    /// Linkage is checked against the retained event before `index`, or the
    /// anchor for `index == 0`. An unsigned event, or a signed one with no
    /// key to check it against, passes the signature check.
    #[must_use]
    pub fn verify_event(&self, event: &AuditEvent, index: usize, key: Option<&PublicKey>) -> bool {
        self.inspect(event, index, key).issues.is_empty()
    }

    /// Fold [`HashChain::verify_event`] over every event, stopping at the first failure.
    #[must_use]
    pub fn verify_integrity(&self, key: Option<&PublicKey>) -> bool {
        self.events
            .iter()
            .enumerate()
            .all(|(index, event)| self.verify_event(event, index, key))
            && self.head_is_consistent()
            && self.counter_is_consistent()
            && self.anchor_is_vouched()
    }

    /// Verify every event and collect all issues found.
    #[must_use]
    pub fn verify(&self, key: Option<&PublicKey>) -> ChainVerificationResult {
        let mut issues = Vec::new();
        let mut entries_verified: usize = 0;
        let mut unverified_signatures: usize = 0;

        for (index, event) in self.events.iter().enumerate() {
            let inspection = self.inspect(event, index, key);
            if inspection.signature_unchecked {
                unverified_signatures = unverified_signatures.saturating_add(1);
            }
            issues.extend(inspection.issues);
            entries_verified = entries_verified.saturating_add(1);
        }

        if !self.head_is_consistent() {
            warn!(last_hash = %self.state.last_hash, "Chain head does not match newest event");
            issues.push(ChainIssue::HeadMismatch {
                expected: self
                    .events
                    .last()
                    .map_or(self.state.anchor_hash, |event| event.hash),
                actual: self.state.last_hash,
            });
        }

        if !self.counter_is_consistent() {
            warn!(next_sequence = self.state.next_sequence, "Sequence counter out of step");
            issues.push(ChainIssue::CounterMismatch {
                expected: self.expected_next_sequence(),
                actual: self.state.next_sequence,
            });
        }

        if !self.anchor_is_vouched() {
            warn!(anchor = %self.state.anchor_hash, "Chain anchor has no trim record");
            issues.push(ChainIssue::UnvouchedAnchor {
                anchor_hash: self.state.anchor_hash,
                trimmed_count: self.state.trimmed_count,
            });
        }

        ChainVerificationResult {
            valid: issues.is_empty(),
            entries_verified,
            issues,
            unverified_signatures,
        }
    }

    /// Drop the `count` oldest events, re-anchor on the last one dropped and
    /// append a signed-if-possible [`RETENTION_TRIMMED`] record.
    ///
    /// Returns the number of events removed.
    pub fn trim_front(
        &mut self,
        count: usize,
        signer: Option<&KeyPair>,
        now: DateTime<Utc>,
    ) -> usize {
        let count = count.min(self.events.len());
        let Some(last_dropped) = count.checked_sub(1).and_then(|i| self.events.get(i)) else {
            return 0;
        };

        let record = TrimRecord {
            previous_anchor: self.state.anchor_hash,
            anchor_hash: last_dropped.hash,
            removed: u64::try_from(count).unwrap_or(u64::MAX),
            trimmed_count: self
                .state
                .trimmed_count
                .saturating_add(u64::try_from(count).unwrap_or(u64::MAX)),
        };

        self.events.drain(..count);
        self.state.anchor_hash = record.anchor_hash;
        self.state.trimmed_count = record.trimmed_count;

        let data = json!({
            "previousAnchor": record.previous_anchor,
            "anchorHash": record.anchor_hash,
            "removed": record.removed,
            "trimmedCount": record.trimmed_count,
        });
        let event = self.append_at(
            EventDraft::new(RETENTION_TRIMMED, EventPayload::plain(data), EventLevel::Info),
            signer,
            now,
        );
        info!(
            entry_id = %event.id,
            removed = count,
            trimmed_total = record.trimmed_count,
            anchor = %record.anchor_hash,
            "Recorded retention trim"
        );
        count
    }

    /// Remove every event and reset all pointers to genesis.
    pub fn clear(&mut self) {
        self.events.clear();
        self.state = ChainState::default();
    }

    fn head_is_consistent(&self) -> bool {
        let expected = self
            .events
            .last()
            .map_or(self.state.anchor_hash, |event| event.hash);
        expected == self.state.last_hash
    }

    fn expected_next_sequence(&self) -> u64 {
        self.state
            .trimmed_count
            .saturating_add(u64::try_from(self.events.len()).unwrap_or(u64::MAX))
    }

    fn counter_is_consistent(&self) -> bool {
        self.state.next_sequence == self.expected_next_sequence()
    }

    /// A genesis chain needs no voucher. A trimmed one needs its newest trim
    /// record to name the current anchor and trimmed count.
    fn anchor_is_vouched(&self) -> bool {
        if self.state.trimmed_count == 0 && self.state.anchor_hash.is_sentinel() {
            return true;
        }
        self.events
            .iter()
            .rev()
            .find_map(TrimRecord::from_event)
            .is_some_and(|record| {
                record.anchor_hash == self.state.anchor_hash
                    && record.trimmed_count == self.state.trimmed_count
            })
    }

    fn expected_previous(&self, index: usize) -> ChainHash {
        index
            .checked_sub(1)
            .and_then(|prev| self.events.get(prev))
            .map_or(self.state.anchor_hash, |prev| prev.hash)
    }

    fn inspect(&self, event: &AuditEvent, index: usize, key: Option<&PublicKey>) -> Inspection {
        let mut inspection = Inspection::default();
        let entry_id = event.id;

        if !event.hash_is_valid() {
            warn!(entry_id = %entry_id, sequence = event.sequence, "Event hash mismatch");
            inspection.issues.push(ChainIssue::HashMismatch {
                entry_id,
                sequence: event.sequence,
            });
        }

        let expected_previous = self.expected_previous(index);
        if !event.follows(&expected_previous) {
            warn!(entry_id = %entry_id, index, "Chain link broken");
            inspection.issues.push(ChainIssue::BrokenLink {
                entry_id,
                expected_previous,
                actual_previous: event.previous_hash,
            });
        }

        let expected_sequence = self
            .state
            .trimmed_count
            .saturating_add(u64::try_from(index).unwrap_or(u64::MAX));
        if event.sequence != expected_sequence {
            warn!(entry_id = %entry_id, expected_sequence, actual = event.sequence, "Sequence gap");
            inspection.issues.push(ChainIssue::SequenceMismatch {
                entry_id,
                expected: expected_sequence,
                actual: event.sequence,
            });
        }

        if !event.payload_is_consistent() {
            warn!(entry_id = %entry_id, "Encrypted flag disagrees with payload");
            inspection
                .issues
                .push(ChainIssue::EncryptionFlagMismatch { entry_id });
        }

        if event.is_signed() {
            match key {
                Some(key) => {
                    if let Err(e) = event.verify_signature(key) {
                        error!(entry_id = %entry_id, error = %e, "Invalid signature");
                        inspection
                            .issues
                            .push(ChainIssue::InvalidSignature { entry_id });
                    }
                },
                None => inspection.signature_unchecked = true,
            }
        }

        inspection
    }
}

#[derive(Debug, Default)]
struct Inspection {
    issues: Vec<ChainIssue>,
    signature_unchecked: bool,
}

/// Result of chain verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainVerificationResult {
    /// Whether the chain is valid.
    pub valid: bool,
    /// Number of entries verified.
    pub entries_verified: usize,
    /// Issues found (empty if valid).
    pub issues: Vec<ChainIssue>,
    /// Signed events that could not be checked because no key was available.
    #[serde(default)]
    pub unverified_signatures: usize,
}

/// An issue found during chain verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainIssue {
    /// Stored hash does not match the recomputed one.
    HashMismatch {
        /// The altered entry.
        entry_id: EventId,
        /// Its recorded sequence.
        sequence: u64,
    },
    /// Chain link is broken.
    BrokenLink {
        /// The entry with broken link.
        entry_id: EventId,
        /// Expected previous hash.
        expected_previous: ChainHash,
        /// Actual previous hash in entry.
        actual_previous: ChainHash,
    },
    /// Sequence number is not where the event sits in the chain.
    SequenceMismatch {
        /// The misplaced entry.
        entry_id: EventId,
        /// Sequence implied by position.
        expected: u64,
        /// Sequence recorded in the entry.
        actual: u64,
    },
    /// `encrypted` does not agree with the payload variant.
    EncryptionFlagMismatch {
        /// The inconsistent entry.
        entry_id: EventId,
    },
    /// Entry has invalid signature.
    InvalidSignature {
        /// The entry with invalid signature.
        entry_id: EventId,
    },
    /// The recorded last hash is not the newest event's hash.
    HeadMismatch {
        /// Hash of the newest retained event (or the anchor).
        expected: ChainHash,
        /// Recorded last hash.
        actual: ChainHash,
    },
    /// The next sequence is not `trimmed_count + len`.
    CounterMismatch {
        /// Sequence implied by the retained events.
        expected: u64,
        /// Recorded next sequence.
        actual: u64,
    },
    /// The chain starts after genesis but no retained trim record names its anchor.
    UnvouchedAnchor {
        /// Recorded anchor.
        anchor_hash: ChainHash,
        /// Recorded trimmed count.
        trimmed_count: u64,
    },
}

impl std::fmt::Display for ChainIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HashMismatch { entry_id, sequence } => {
                write!(f, "Hash mismatch at {entry_id} (sequence {sequence})")
            },
            Self::BrokenLink { entry_id, .. } => {
                write!(f, "Broken chain link at {entry_id}")
            },
            Self::SequenceMismatch {
                entry_id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Sequence mismatch at {entry_id}: expected {expected}, found {actual}"
                )
            },
            Self::EncryptionFlagMismatch { entry_id } => {
                write!(f, "Encrypted flag mismatch at {entry_id}")
            },
            Self::InvalidSignature { entry_id } => {
                write!(f, "Invalid signature at {entry_id}")
            },
            Self::HeadMismatch { .. } => {
                write!(f, "Last hash does not match the newest event")
            },
            Self::CounterMismatch { expected, actual } => {
                write!(f, "Next sequence is {actual}, expected {expected}")
            },
            Self::UnvouchedAnchor { trimmed_count, .. } => {
                write!(
                    f,
                    "Chain claims {trimmed_count} trimmed events without a trim record"
                )
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventLevel, EventPayload};
    use serde_json::json;

    fn draft(i: usize) -> EventDraft {
        EventDraft::new(
            format!("event_{i}"),
            EventPayload::plain(json!({ "i": i })),
            EventLevel::Info,
        )
    }

    fn chain_of(n: usize, signer: Option<&KeyPair>) -> HashChain {
        let mut chain = HashChain::new();
        for i in 0..n {
            chain.append(draft(i), signer);
        }
        chain
    }

    #[test]
    fn test_append_links_events() {
        let chain = chain_of(3, None);
        let events = chain.events();

        assert!(events[0].previous_hash.is_sentinel());
        for i in 1..events.len() {
            assert_eq!(events[i].previous_hash, events[i - 1].hash);
        }
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.sequence, i as u64);
        }
        assert_eq!(chain.state().last_hash, events[2].hash);
        assert_eq!(chain.state().next_sequence, 3);
    }

    #[test]
    fn test_chain_verification() {
        let chain = chain_of(5, None);
        assert!(chain.verify_integrity(None));

        let result = chain.verify(None);
        assert!(result.valid);
        assert_eq!(result.entries_verified, 5);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_empty_chain_is_valid() {
        let chain = HashChain::new();
        assert!(chain.verify_integrity(None));
        assert_eq!(chain.verify(None).entries_verified, 0);
    }

    #[test]
    fn test_tampered_data_detected() {
        let mut chain = chain_of(4, None);
        chain.events[2].data = EventPayload::plain(json!({ "i": 99 }));

        assert!(!chain.verify_integrity(None));
        let result = chain.verify(None);
        assert!(!result.valid);
        assert!(matches!(
            result.issues[0],
            ChainIssue::HashMismatch { sequence: 2, .. }
        ));
    }

    #[test]
    fn test_rehashed_tamper_breaks_next_link() {
        let mut chain = chain_of(4, None);
        chain.events[1].event_type = "forged".to_owned();
        chain.events[1].hash = chain.events[1].compute_hash();

        let result = chain.verify(None);
        assert!(!result.valid);
        let broken = chain.events[2].id;
        assert!(result.issues.iter().any(
            |issue| matches!(issue, ChainIssue::BrokenLink { entry_id, .. } if *entry_id == broken)
        ));
    }

    #[test]
    fn test_swap_detected() {
        let mut chain = chain_of(4, None);
        chain.events.swap(1, 2);

        assert!(!chain.verify_integrity(None));
        let result = chain.verify(None);
        assert!(
            result
                .issues
                .iter()
                .any(|issue| matches!(issue, ChainIssue::BrokenLink { .. }))
        );
        assert!(
            result
                .issues
                .iter()
                .any(|issue| matches!(issue, ChainIssue::SequenceMismatch { .. }))
        );
    }

    #[test]
    fn test_truncated_tail_detected() {
        let mut chain = chain_of(3, None);
        chain.events.pop();

        assert!(!chain.verify_integrity(None));
        assert!(
            chain
                .verify(None)
                .issues
                .iter()
                .any(|issue| matches!(issue, ChainIssue::HeadMismatch { .. }))
        );
    }

    #[test]
    fn test_signed_chain() {
        let keypair = KeyPair::generate();
        let chain = chain_of(3, Some(&keypair));
        let public = keypair.export_public_key();

        assert!(chain.events().iter().all(AuditEvent::is_signed));
        assert!(chain.verify_integrity(Some(&public)));

        let other = KeyPair::generate().export_public_key();
        assert!(!chain.verify_integrity(Some(&other)));
        let result = chain.verify(Some(&other));
        assert_eq!(
            result
                .issues
                .iter()
                .filter(|issue| matches!(issue, ChainIssue::InvalidSignature { .. }))
                .count(),
            3
        );
    }

    #[test]
    fn test_signature_without_key_is_unverified_not_invalid() {
        let keypair = KeyPair::generate();
        let chain = chain_of(2, Some(&keypair));

        let result = chain.verify(None);
        assert!(result.valid);
        assert_eq!(result.unverified_signatures, 2);
    }

    #[test]
    fn test_encrypted_flag_mismatch_detected() {
        let mut chain = chain_of(2, None);
        chain.events[0].encrypted = true;

        let result = chain.verify(None);
        assert_eq!(
            result.issues,
            vec![ChainIssue::EncryptionFlagMismatch {
                entry_id: chain.events[0].id
            }]
        );
    }

    #[test]
    fn test_verify_event_against_neighbor() {
        let chain = chain_of(3, None);
        let events = chain.events();
        assert!(chain.verify_event(&events[1], 1, None));
        assert!(!chain.verify_event(&events[1], 2, None));
    }

    #[test]
    fn test_trim_front_reanchors_and_records() {
        let mut chain = chain_of(5, None);
        let dropped_hash = chain.events()[1].hash;

        assert_eq!(chain.trim_front(2, None, Utc::now()), 2);
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.state().anchor_hash, dropped_hash);
        assert_eq!(chain.state().trimmed_count, 2);
        assert_eq!(chain.events()[0].sequence, 2);

        let record = chain.events().last().unwrap();
        assert_eq!(record.event_type, RETENTION_TRIMMED);
        assert_eq!(record.sequence, 5);
        let data = record.data.as_plain().unwrap();
        assert_eq!(data["anchorHash"], json!(dropped_hash.to_hex()));
        assert_eq!(data["trimmedCount"], 2);
        assert_eq!(data["removed"], 2);
        assert!(chain.verify_integrity(None));

        chain.append(draft(6), None);
        assert_eq!(chain.events().last().unwrap().sequence, 6);
        assert!(chain.verify_integrity(None));
    }

    #[test]
    fn test_trim_record_is_signed_with_signer() {
        let keypair = KeyPair::generate();
        let mut chain = chain_of(3, Some(&keypair));
        chain.trim_front(1, Some(&keypair), Utc::now());

        assert!(chain.events().last().unwrap().is_signed());
        assert!(chain.verify_integrity(Some(&keypair.export_public_key())));
    }

    #[test]
    fn test_trim_more_than_len() {
        let mut chain = chain_of(2, None);
        let last = chain.state().last_hash;

        assert_eq!(chain.trim_front(10, None, Utc::now()), 2);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.state().anchor_hash, last);
        assert!(chain.verify_integrity(None));
        assert_eq!(chain.trim_front(0, None, Utc::now()), 0);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_successive_trims_vouch_for_latest_anchor() {
        let mut chain = chain_of(4, None);
        chain.trim_front(2, None, Utc::now());
        chain.append(draft(10), None);
        chain.trim_front(2, None, Utc::now());

        assert_eq!(chain.state().trimmed_count, 4);
        assert!(chain.verify_integrity(None));
    }

    #[test]
    fn test_dropped_prefix_without_record_detected() {
        let keypair = KeyPair::generate();
        let chain = chain_of(5, Some(&keypair));
        let state = chain.state();

        let kept = chain.events()[3..].to_vec();
        let forged = ChainState {
            anchor_hash: kept[0].previous_hash,
            trimmed_count: 3,
            ..state
        };
        let tampered = HashChain::restore(kept, forged);
        let public = keypair.export_public_key();

        assert!(!tampered.verify_integrity(Some(&public)));
        let result = tampered.verify(Some(&public));
        assert_eq!(
            result.issues,
            vec![ChainIssue::UnvouchedAnchor {
                anchor_hash: forged.anchor_hash,
                trimmed_count: 3,
            }]
        );
    }

    #[test]
    fn test_stale_trim_record_does_not_vouch_for_deeper_cut() {
        let mut chain = chain_of(6, None);
        chain.trim_front(1, None, Utc::now());
        let state = chain.state();

        // Drop one more retained event and point the anchor past it.
        let kept = chain.events()[1..].to_vec();
        let forged = ChainState {
            anchor_hash: kept[0].previous_hash,
            trimmed_count: state.trimmed_count + 1,
            ..state
        };
        let result = HashChain::restore(kept, forged).verify(None);
        assert!(
            result
                .issues
                .iter()
                .any(|issue| matches!(issue, ChainIssue::UnvouchedAnchor { .. }))
        );
    }

    #[test]
    fn test_counter_mismatch_detected() {
        let chain = chain_of(3, None);
        let forged = ChainState {
            next_sequence: 100,
            ..chain.state()
        };
        let restored = HashChain::restore(chain.events().to_vec(), forged);

        assert!(!restored.verify_integrity(None));
        assert_eq!(
            restored.verify(None).issues,
            vec![ChainIssue::CounterMismatch {
                expected: 3,
                actual: 100,
            }]
        );
    }

    #[test]
    fn test_clear_resets_to_genesis() {
        let mut chain = chain_of(3, None);
        chain.trim_front(1, None, Utc::now());
        chain.clear();

        assert!(chain.is_empty());
        assert_eq!(chain.state(), ChainState::default());
        let event = chain.append(draft(0), None);
        assert_eq!(event.sequence, 0);
        assert!(event.previous_hash.is_sentinel());
    }

    #[test]
    fn test_restore_round_trip() {
        let chain = chain_of(3, None);
        let restored = HashChain::restore(chain.events().to_vec(), chain.state());
        assert!(restored.verify_integrity(None));
        assert_eq!(restored.state(), chain.state());
    }

    #[test]
    fn test_issue_display() {
        let issue = ChainIssue::InvalidSignature {
            entry_id: EventId::new(),
        };
        assert!(issue.to_string().starts_with("Invalid signature at"));
    }
}
