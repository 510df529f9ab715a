//! Export and import documents.
//!
//! Export and import are the only persistence boundary. An export carries
//! the chain pointers so an import can resume appending where it left off.

use acey_crypto::ChainHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::{ChainState, ChainVerificationResult};
use crate::event::AuditEvent;
use crate::mode::AuditMode;

/// Chain pointers and summary written alongside exported events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    /// When the export was produced.
    pub export_time: DateTime<Utc>,
    /// Mode at export time.
    pub mode: AuditMode,
    /// Number of events in `events`.
    pub event_count: usize,
    /// Sequence the next appended event would carry.
    pub sequence: u64,
    /// Hash of the newest event.
    pub last_hash: ChainHash,
    /// `previous_hash` of the oldest exported event.
    #[serde(default)]
    pub anchor_hash: ChainHash,
    /// Events dropped by retention before the export.
    #[serde(default)]
    pub trimmed_count: u64,
    /// Verification result at export time, if requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<ChainVerificationResult>,
}

impl ExportMetadata {
    /// Chain pointers recorded in the metadata.
    #[must_use]
    pub fn chain_state(&self) -> ChainState {
        ChainState {
            next_sequence: self.sequence,
            last_hash: self.last_hash,
            anchor_hash: self.anchor_hash,
            trimmed_count: self.trimmed_count,
        }
    }
}

/// A complete exported log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Chain pointers and summary.
    pub metadata: ExportMetadata,
    /// Events, oldest first.
    pub events: Vec<AuditEvent>,
}

impl ExportDocument {
    /// Parse an export, reporting every structural problem found.
    ///
    /// # Errors
    ///
    /// Returns the list of problems if the payload is not a usable export.
    pub fn parse(payload: &str) -> Result<Self, Vec<String>> {
        let value: serde_json::Value =
            serde_json::from_str(payload).map_err(|e| vec![format!("invalid JSON: {e}")])?;

        let mut errors = Vec::new();
        let Some(object) = value.as_object() else {
            return Err(vec!["export must be a JSON object".to_owned()]);
        };
        if !object.get("metadata").is_some_and(serde_json::Value::is_object) {
            errors.push("missing or malformed 'metadata' section".to_owned());
        }
        if !object.get("events").is_some_and(serde_json::Value::is_array) {
            errors.push("missing or malformed 'events' section".to_owned());
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let document: Self =
            serde_json::from_value(value).map_err(|e| vec![format!("malformed export: {e}")])?;
        if document.metadata.event_count != document.events.len() {
            return Err(vec![format!(
                "metadata declares {} events but {} are present",
                document.metadata.event_count,
                document.events.len()
            )]);
        }
        let metadata = &document.metadata;
        let expected_sequence = u64::try_from(metadata.event_count)
            .ok()
            .and_then(|count| metadata.trimmed_count.checked_add(count));
        if expected_sequence != Some(metadata.sequence) {
            return Err(vec![format!(
                "metadata sequence {} does not follow {} trimmed and {} retained events",
                metadata.sequence, metadata.trimmed_count, metadata.event_count
            )]);
        }
        Ok(document)
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Whether the log was replaced.
    pub success: bool,
    /// Why the import was refused.
    pub errors: Vec<String>,
    /// Number of events loaded.
    pub events_imported: usize,
    /// `metadata.verification.valid` from the source, if it was recorded.
    pub source_verified: Option<bool>,
}

impl ImportReport {
    /// A refused import.
    #[must_use]
    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            success: false,
            errors,
            events_imported: 0,
            source_verified: None,
        }
    }
}
