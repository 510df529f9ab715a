//! Audit event types.
//!
//! Every call to the logger produces one [`AuditEvent`]. Events are
//! chain-linked (each carries the hash of its predecessor) and, depending on
//! the operating mode, signed and carry a sealed payload.

use std::fmt;
use std::str::FromStr;

use acey_crypto::{ChainHash, ChainHasher, PublicKey, SealedBundle, Signature};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuditError, AuditResult};

/// Derivation context for event hashes.
pub const EVENT_HASH_DOMAIN: &str = "acey-audit event v1";

/// Unique identifier for an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Create a new random event ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    /// Routine activity.
    Info,
    /// Something worth a second look.
    Warning,
    /// A failed operation.
    Error,
    /// Security-relevant failure or policy action.
    Critical,
}

impl EventLevel {
    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Error and critical events are always treated as sensitive.
    #[must_use]
    pub fn is_severe(self) -> bool {
        matches!(self, Self::Error | Self::Critical)
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventLevel {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(AuditError::InvalidConfig {
                field: "level".to_owned(),
                message: format!("unknown event level '{other}'"),
            }),
        }
    }
}

/// Event payload: either the caller's JSON value or its sealed ciphertext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// Plaintext JSON.
    Plain {
        /// The caller-supplied value.
        value: serde_json::Value,
    },
    /// AES-256-GCM sealed canonical JSON.
    Sealed {
        /// `nonce:ciphertext:tag`, hex-encoded.
        bundle: SealedBundle,
    },
}

impl EventPayload {
    /// Wrap a plaintext value.
    #[must_use]
    pub fn plain(value: serde_json::Value) -> Self {
        Self::Plain { value }
    }

    /// Whether the payload is sealed.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        matches!(self, Self::Sealed { .. })
    }

    /// The plaintext value, if not sealed.
    #[must_use]
    pub fn as_plain(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Plain { value } => Some(value),
            Self::Sealed { .. } => None,
        }
    }
}

/// An event that has not yet been placed on the chain.
///
/// The chain engine stamps sequence, hashes and signature on append.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    /// Identifier the appended event will carry.
    pub id: EventId,
    /// Free-form event type.
    pub event_type: String,
    /// Payload, already sealed if required.
    pub data: EventPayload,
    /// Severity.
    pub level: EventLevel,
    /// Recorded while incident mode was blocking this type.
    pub blocked: bool,
}

impl EventDraft {
    /// Create a draft with a fresh ID.
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: EventPayload, level: EventLevel) -> Self {
        Self {
            id: EventId::new(),
            event_type: event_type.into(),
            data,
            level,
            blocked: false,
        }
    }

    /// Mark the draft as blocked.
    #[must_use]
    pub fn blocked(mut self) -> Self {
        self.blocked = true;
        self
    }
}

/// A single event on the audit chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Unique event identifier.
    pub id: EventId,
    /// When the event was appended.
    pub timestamp: DateTime<Utc>,
    /// Free-form event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Plain or sealed payload.
    pub data: EventPayload,
    /// Severity.
    pub level: EventLevel,
    /// Absolute position since the genesis event.
    pub sequence: u64,
    /// Hash of this event's canonical form.
    pub hash: ChainHash,
    /// Hash of the preceding event, or the chain anchor.
    pub previous_hash: ChainHash,
    /// Signature over `hash`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    /// True iff `data` is sealed.
    pub encrypted: bool,
    /// Recorded while incident mode was blocking this type.
    #[serde(default)]
    pub blocked: bool,
}

impl AuditEvent {
    /// Build an unsigned event from a draft at a chain position.
    pub(crate) fn from_draft(
        draft: EventDraft,
        timestamp: DateTime<Utc>,
        sequence: u64,
        previous_hash: ChainHash,
    ) -> Self {
        let encrypted = draft.data.is_sealed();
        let mut event = Self {
            id: draft.id,
            timestamp,
            event_type: draft.event_type,
            data: draft.data,
            level: draft.level,
            sequence,
            hash: ChainHash::sentinel(),
            previous_hash,
            signature: None,
            encrypted,
            blocked: draft.blocked,
        };
        event.hash = event.compute_hash();
        event
    }

    /// Recompute the hash over the canonical field tuple.
    ///
    /// The stored `hash` and `signature` are not inputs.
    #[must_use]
    pub fn compute_hash(&self) -> ChainHash {
        let timestamp = self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true);
        // Object keys serialize sorted, so this is canonical for a given value.
        let data = serde_json::to_vec(&self.data).unwrap_or_default();

        ChainHasher::new(EVENT_HASH_DOMAIN)
            .field("id", self.id.0.as_bytes())
            .field("timestamp", timestamp.as_bytes())
            .field("type", self.event_type.as_bytes())
            .field("data", &data)
            .field("level", self.level.as_str().as_bytes())
            .field_u64("sequence", self.sequence)
            .field("previous_hash", self.previous_hash.as_bytes())
            .field("blocked", &[u8::from(self.blocked)])
            .finish()
    }

    /// Whether the stored hash matches the recomputed one.
    #[must_use]
    pub fn hash_is_valid(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Check if this event links to `previous_hash`.
    #[must_use]
    pub fn follows(&self, previous_hash: &ChainHash) -> bool {
        self.previous_hash == *previous_hash
    }

    /// Whether the event carries a signature.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Whether the `encrypted` flag agrees with the payload variant.
    #[must_use]
    pub fn payload_is_consistent(&self) -> bool {
        self.encrypted == self.data.is_sealed()
    }

    /// Verify the signature over the stored hash.
    ///
    /// An unsigned event verifies trivially.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Crypto`] if the signature does not match.
    pub fn verify_signature(&self, key: &PublicKey) -> AuditResult<()> {
        match &self.signature {
            Some(signature) => key
                .verify(self.hash.as_bytes(), signature)
                .map_err(AuditError::from),
            None => Ok(()),
        }
    }
}
