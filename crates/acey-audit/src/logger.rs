//! Audit logger - main interface for recording and verifying events.
//!
//! [`EnterpriseAuditLogger`] runs every event through the same pipeline:
//! incident gating, payload sealing, chain append, an optional block
//! notice, and retention. All state sits behind one lock, so the logger can
//! be shared across threads behind an `Arc`.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use acey_crypto::{AuditCipher, KeyPair, PublicKey};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::chain::{ChainVerificationResult, HashChain};
use crate::config::LoggerConfig;
use crate::confidentiality::Confidentiality;
use crate::error::{AuditError, AuditResult};
use crate::event::{AuditEvent, EventDraft, EventLevel};
use crate::export::{ExportDocument, ExportMetadata, ImportReport};
use crate::mode::{AuditMode, Interception, ModeController};
use crate::retention::RetentionPolicy;
use crate::stats::AuditStatistics;

/// Event recorded after a blocked risky operation.
pub const RISKY_OPERATION_BLOCKED: &str = "risky_operation_blocked";
/// Event recorded when incident mode is entered.
pub const INCIDENT_MODE_ENABLED: &str = "incident_mode_enabled";
/// Event recorded when incident mode is left.
pub const INCIDENT_MODE_DISABLED: &str = "incident_mode_disabled";
/// Event recorded on every mode change.
pub const MODE_CHANGED: &str = "mode_changed";

const BLOCK_REASON: &str = "incident mode blocks risky operations";

struct LedgerState {
    chain: HashChain,
    modes: ModeController,
}

/// Hash-chained, mode-aware audit logger.
pub struct EnterpriseAuditLogger {
    state: RwLock<LedgerState>,
    signer: Option<KeyPair>,
    confidentiality: Confidentiality,
    retention: RetentionPolicy,
    immutable: bool,
}

impl EnterpriseAuditLogger {
    /// Create a logger from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::MissingSigningKey`] or
    /// [`AuditError::MissingEncryptionKey`] if the initial mode needs a key
    /// that is not configured, or a crypto error if key derivation fails.
    pub fn new(config: LoggerConfig) -> AuditResult<Self> {
        let signer = config
            .signature_key
            .as_deref()
            .map(KeyPair::from_secret_material);
        let cipher = config
            .encryption_key
            .as_deref()
            .map(AuditCipher::from_secret)
            .transpose()?;
        require_keys(config.mode, signer.is_some(), cipher.is_some())?;
        Ok(Self::assemble(&config, signer, cipher))
    }

    /// Standard mode, 30-day retention, no secrets.
    #[must_use]
    pub fn standard() -> Self {
        Self::assemble(&LoggerConfig::standard(), None, None)
    }

    /// Audit mode with signing and encryption, seven-year retention.
    ///
    /// # Errors
    ///
    /// Returns a crypto error if the encryption key cannot be derived.
    pub fn audit(
        encryption_key: impl Into<String>,
        signature_key: impl Into<String>,
    ) -> AuditResult<Self> {
        Self::new(LoggerConfig::audit(encryption_key, signature_key))
    }

    /// Incident mode, century-long retention, no secrets.
    #[must_use]
    pub fn incident() -> Self {
        Self::assemble(&LoggerConfig::incident(), None, None)
    }

    fn assemble(config: &LoggerConfig, signer: Option<KeyPair>, cipher: Option<AuditCipher>) -> Self {
        let catalogues = config.catalogues.clone();
        let modes = ModeController::new(
            config.mode,
            catalogues.write_capable_skills,
            catalogues.risky_operations,
        );

        info!(
            mode = %config.mode,
            immutable = config.immutable,
            signing = signer.is_some(),
            encryption = cipher.is_some(),
            "Audit logger initialised"
        );

        Self {
            state: RwLock::new(LedgerState {
                chain: HashChain::new(),
                modes,
            }),
            signer,
            confidentiality: Confidentiality::new(catalogues.sensitive_types, cipher),
            retention: config.retention_policy(),
            immutable: config.immutable,
        }
    }

    fn read(&self) -> AuditResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|e| AuditError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> AuditResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|e| AuditError::LockPoisoned(e.to_string()))
    }

    fn verifying_key(&self) -> Option<PublicKey> {
        self.signer.as_ref().map(KeyPair::export_public_key)
    }

    /// Key used to sign events appended in `mode`, if any.
    fn signer_for(&self, mode: AuditMode) -> AuditResult<Option<&KeyPair>> {
        match mode {
            AuditMode::Standard => Ok(None),
            AuditMode::Audit => self
                .signer
                .as_ref()
                .map(Some)
                .ok_or(AuditError::MissingSigningKey { mode }),
            AuditMode::Incident => Ok(self.signer.as_ref()),
        }
    }

    fn draft(
        &self,
        mode: AuditMode,
        event_type: &str,
        data: serde_json::Value,
        level: EventLevel,
    ) -> AuditResult<EventDraft> {
        let payload = self.confidentiality.prepare(mode, event_type, level, data)?;
        Ok(EventDraft::new(event_type, payload, level))
    }

    fn enforce(&self, state: &mut LedgerState, signer: Option<&KeyPair>) -> usize {
        let mode = state.modes.mode();
        self.retention.apply(&mut state.chain, mode, signer)
    }

    /// Record an event.
    ///
    /// In incident mode a risky event type is recorded with `blocked = true`
    /// and followed by a critical `risky_operation_blocked` event. Returns
    /// the recorded event.
    ///
    /// # Errors
    ///
    /// Returns an error if the current mode needs a key that is missing,
    /// sealing fails, or the lock is poisoned. The log is unchanged on error.
    pub fn log(
        &self,
        event_type: &str,
        data: serde_json::Value,
        level: EventLevel,
    ) -> AuditResult<AuditEvent> {
        let mut state = self.write()?;
        let mode = state.modes.mode();
        let signer = self.signer_for(mode)?;

        let mut draft = self.draft(mode, event_type, data, level)?;
        let notice = match state.modes.intercept(event_type) {
            Interception::Allowed => None,
            Interception::Blocked => {
                draft = draft.blocked();
                Some(self.draft(
                    mode,
                    RISKY_OPERATION_BLOCKED,
                    json!({
                        "originalEventId": draft.id.to_string(),
                        "originalType": event_type,
                        "reason": BLOCK_REASON,
                    }),
                    EventLevel::Critical,
                )?)
            },
        };

        let event = state.chain.append(draft, signer);
        if let Some(notice) = notice {
            warn!(entry_id = %event.id, event_type, "Risky operation blocked in incident mode");
            state.chain.append(notice, signer);
        }
        self.enforce(&mut state, signer);
        Ok(event)
    }

    /// Switch operating mode and record the transition.
    ///
    /// Returns the events recorded for the change; empty when `mode` is
    /// already current.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::MissingSigningKey`] or
    /// [`AuditError::MissingEncryptionKey`] if `mode` needs a key that is not
    /// configured. Neither the mode nor the log changes on error.
    pub fn set_mode(&self, mode: AuditMode) -> AuditResult<Vec<AuditEvent>> {
        let mut state = self.write()?;
        let mut modes = state.modes.clone();
        let Some(transition) = modes.transition(mode) else {
            debug!(mode = %mode, "Mode unchanged");
            return Ok(Vec::new());
        };

        require_keys(mode, self.signer.is_some(), self.confidentiality.has_key())?;
        let signer = self.signer_for(mode)?;

        let mut drafts = Vec::with_capacity(2);
        if transition.entered_incident() {
            drafts.push(self.draft(
                mode,
                INCIDENT_MODE_ENABLED,
                json!({
                    "disabledSkills": transition.disabled,
                    "previousMode": transition.from,
                }),
                EventLevel::Critical,
            )?);
        }
        if transition.left_incident() {
            drafts.push(self.draft(
                mode,
                INCIDENT_MODE_DISABLED,
                json!({ "reenabledSkills": transition.reenabled }),
                EventLevel::Warning,
            )?);
        }
        drafts.push(self.draft(
            mode,
            MODE_CHANGED,
            json!({ "from": transition.from, "to": transition.to }),
            EventLevel::Info,
        )?);

        state.modes = modes;
        info!(
            from = %transition.from,
            to = %transition.to,
            disabled = transition.disabled.len(),
            reenabled = transition.reenabled.len(),
            "Audit mode changed"
        );

        let events = drafts
            .into_iter()
            .map(|draft| state.chain.append(draft, signer))
            .collect();
        self.enforce(&mut state, signer);
        Ok(events)
    }

    /// Current mode.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::LockPoisoned`] if the lock is poisoned.
    pub fn mode(&self) -> AuditResult<AuditMode> {
        Ok(self.read()?.modes.mode())
    }

    /// Whether a skill may run. Fails closed if the lock is poisoned.
    #[must_use]
    pub fn is_skill_allowed(&self, skill_id: &str) -> bool {
        match self.read() {
            Ok(state) => state.modes.is_skill_allowed(skill_id),
            Err(e) => {
                error!(skill_id, error = %e, "Denying skill, audit state unavailable");
                false
            },
        }
    }

    /// Sorted snapshot of the disabled skills.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::LockPoisoned`] if the lock is poisoned.
    pub fn disabled_skills(&self) -> AuditResult<Vec<String>> {
        Ok(self.read()?.modes.disabled_skills())
    }

    /// Check one event as if it sat at `index` of the current chain.
    #[must_use]
    pub fn verify_event(&self, event: &AuditEvent, index: usize) -> bool {
        let key = self.verifying_key();
        self.read()
            .is_ok_and(|state| state.chain.verify_event(event, index, key.as_ref()))
    }

    /// Whether every event verifies. Stops at the first failure.
    #[must_use]
    pub fn verify_chain_integrity(&self) -> bool {
        let key = self.verifying_key();
        self.read()
            .is_ok_and(|state| state.chain.verify_integrity(key.as_ref()))
    }

    /// Verify every event and collect all issues.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::LockPoisoned`] if the lock is poisoned.
    pub fn verify_chain(&self) -> AuditResult<ChainVerificationResult> {
        let key = self.verifying_key();
        Ok(self.read()?.chain.verify(key.as_ref()))
    }

    /// Apply retention now. Returns the number of events removed.
    ///
    /// Any trim is recorded as a `retention_trimmed` event, signed under the
    /// current mode's rules.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::LockPoisoned`] if the lock is poisoned, or
    /// [`AuditError::MissingSigningKey`] if the mode signs and no key is set.
    pub fn enforce_retention(&self) -> AuditResult<usize> {
        let mut state = self.write()?;
        let signer = self.signer_for(state.modes.mode())?;
        Ok(self.enforce(&mut state, signer))
    }

    /// Snapshot the log with its chain pointers.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::LockPoisoned`] if the lock is poisoned.
    pub fn export(&self, include_verification: bool) -> AuditResult<ExportDocument> {
        let key = self.verifying_key();
        let state = self.read()?;
        let pointers = state.chain.state();

        let document = ExportDocument {
            metadata: ExportMetadata {
                export_time: Utc::now(),
                mode: state.modes.mode(),
                event_count: state.chain.len(),
                sequence: pointers.next_sequence,
                last_hash: pointers.last_hash,
                anchor_hash: pointers.anchor_hash,
                trimmed_count: pointers.trimmed_count,
                verification: include_verification.then(|| state.chain.verify(key.as_ref())),
            },
            events: state.chain.events().to_vec(),
        };

        info!(
            events = document.metadata.event_count,
            verified = include_verification,
            "Exported audit log"
        );
        Ok(document)
    }

    /// [`EnterpriseAuditLogger::export`] as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned or serialization fails.
    pub fn export_json(&self, include_verification: bool) -> AuditResult<String> {
        let document = self.export(include_verification)?;
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Replace the log with an export.
    ///
    /// The source's recorded verification is reported but not enforced; run
    /// [`EnterpriseAuditLogger::verify_chain`] afterwards to check the data.
    /// On failure the existing log is untouched.
    pub fn import(&self, payload: &str) -> ImportReport {
        let document = match ExportDocument::parse(payload) {
            Ok(document) => document,
            Err(errors) => {
                warn!(errors = errors.len(), "Rejected audit import");
                return ImportReport::failed(errors);
            },
        };

        let mut state = match self.write() {
            Ok(state) => state,
            Err(e) => return ImportReport::failed(vec![e.to_string()]),
        };
        if self.immutable && !state.chain.is_empty() {
            warn!(held = state.chain.len(), "Refused import over immutable log");
            return ImportReport::failed(vec![format!(
                "{} and already holds {} events",
                AuditError::ImmutableLog,
                state.chain.len()
            )]);
        }

        let source_verified = document.metadata.verification.as_ref().map(|v| v.valid);
        let pointers = document.metadata.chain_state();
        let events_imported = document.events.len();
        state.chain = HashChain::restore(document.events, pointers);

        info!(
            events = events_imported,
            source_verified = ?source_verified,
            next_sequence = pointers.next_sequence,
            "Imported audit log"
        );
        ImportReport {
            success: true,
            errors: Vec::new(),
            events_imported,
            source_verified,
        }
    }

    /// Summarise the log.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::LockPoisoned`] if the lock is poisoned.
    pub fn statistics(&self) -> AuditResult<AuditStatistics> {
        let key = self.verifying_key();
        let state = self.read()?;
        Ok(AuditStatistics::collect(
            state.chain.events(),
            state.modes.mode(),
            state.modes.disabled_skills(),
            state.chain.verify_integrity(key.as_ref()),
            state.chain.state().trimmed_count,
        ))
    }

    /// Remove every event and reset the chain to genesis.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::ImmutableLog`] if the logger is immutable.
    pub fn clear(&self) -> AuditResult<()> {
        if self.immutable {
            return Err(AuditError::ImmutableLog);
        }
        let mut state = self.write()?;
        let removed = state.chain.len();
        state.chain.clear();
        warn!(removed, "Audit log cleared");
        Ok(())
    }

    /// Snapshot of the retained events, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::LockPoisoned`] if the lock is poisoned.
    pub fn events(&self) -> AuditResult<Vec<AuditEvent>> {
        Ok(self.read()?.chain.events().to_vec())
    }

    /// Number of retained events.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::LockPoisoned`] if the lock is poisoned.
    pub fn len(&self) -> AuditResult<usize> {
        Ok(self.read()?.chain.len())
    }

    /// Whether the log holds no events.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::LockPoisoned`] if the lock is poisoned.
    pub fn is_empty(&self) -> AuditResult<bool> {
        Ok(self.read()?.chain.is_empty())
    }

    /// Whether `clear` and import-over-existing are refused.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// The verifying key, when signing is configured.
    #[must_use]
    pub fn public_key(&self) -> Option<PublicKey> {
        self.verifying_key()
    }

    /// Recover the plaintext of a sealed event.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::NotEncrypted`] for plaintext events,
    /// [`AuditError::MissingEncryptionKey`] without a key, and a crypto error
    /// if the bundle is malformed or was sealed under another key.
    pub fn decrypt_event(&self, event: &AuditEvent) -> AuditResult<serde_json::Value> {
        let mode = self.mode()?;
        self.confidentiality.reveal(mode, event)
    }
}

impl std::fmt::Debug for EnterpriseAuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnterpriseAuditLogger")
            .field(
                "signing_key_id",
                &self.signer.as_ref().map(KeyPair::key_id_hex),
            )
            .field("encryption", &self.confidentiality.has_key())
            .field("immutable", &self.immutable)
            .finish_non_exhaustive()
    }
}

fn require_keys(mode: AuditMode, has_signer: bool, has_cipher: bool) -> AuditResult<()> {
    if mode.requires_signing() && !has_signer {
        return Err(AuditError::MissingSigningKey { mode });
    }
    if mode.encrypts_sensitive() && !has_cipher {
        return Err(AuditError::MissingEncryptionKey { mode });
    }
    Ok(())
}
