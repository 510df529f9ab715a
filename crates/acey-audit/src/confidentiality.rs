//! Sensitivity classification and payload sealing.

use std::collections::BTreeSet;

use acey_crypto::AuditCipher;

use crate::error::{AuditError, AuditResult};
use crate::event::{AuditEvent, EventLevel, EventPayload};
use crate::mode::AuditMode;

/// Decides whether event payloads are sealed and performs the sealing.
#[derive(Debug)]
pub struct Confidentiality {
    sensitive_types: BTreeSet<String>,
    cipher: Option<AuditCipher>,
}

impl Confidentiality {
    /// Create the layer from the sensitive catalogue and an optional cipher.
    #[must_use]
    pub fn new(sensitive_types: impl IntoIterator<Item = String>, cipher: Option<AuditCipher>) -> Self {
        Self {
            sensitive_types: sensitive_types.into_iter().collect(),
            cipher,
        }
    }

    /// Whether an encryption key is configured.
    #[must_use]
    pub fn has_key(&self) -> bool {
        self.cipher.is_some()
    }

    /// An event is sensitive if its type is catalogued or its level is error or critical.
    #[must_use]
    pub fn is_sensitive(&self, event_type: &str, level: EventLevel) -> bool {
        level.is_severe() || self.sensitive_types.contains(event_type)
    }

    /// Turn caller data into a payload, sealing it when `mode` requires.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::MissingEncryptionKey`] if sealing is required but
    /// no key is configured, or a crypto error if sealing fails.
    pub fn prepare(
        &self,
        mode: AuditMode,
        event_type: &str,
        level: EventLevel,
        data: serde_json::Value,
    ) -> AuditResult<EventPayload> {
        if !mode.encrypts_sensitive() || !self.is_sensitive(event_type, level) {
            return Ok(EventPayload::plain(data));
        }

        let cipher = self
            .cipher
            .as_ref()
            .ok_or(AuditError::MissingEncryptionKey { mode })?;
        let plaintext = serde_json::to_vec(&data)?;
        let bundle = cipher.seal(&plaintext)?;
        Ok(EventPayload::Sealed { bundle })
    }

    /// Recover the plaintext value of a sealed event.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::NotEncrypted`] for plaintext events,
    /// [`AuditError::MissingEncryptionKey`] without a key, and a crypto error
    /// if the tag does not verify.
    pub fn reveal(&self, mode: AuditMode, event: &AuditEvent) -> AuditResult<serde_json::Value> {
        let EventPayload::Sealed { bundle } = &event.data else {
            return Err(AuditError::NotEncrypted {
                event_id: event.id.to_string(),
            });
        };
        let cipher = self
            .cipher
            .as_ref()
            .ok_or(AuditError::MissingEncryptionKey { mode })?;
        let plaintext = cipher.open(bundle)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDraft;
    use acey_crypto::ChainHash;
    use chrono::Utc;
    use serde_json::json;

    fn layer(secret: Option<&str>) -> Confidentiality {
        Confidentiality::new(
            ["credentials".to_owned()],
            secret.map(|s| AuditCipher::from_secret(s).unwrap()),
        )
    }

    fn event_with(payload: EventPayload) -> AuditEvent {
        AuditEvent::from_draft(
            EventDraft::new("credentials", payload, EventLevel::Info),
            Utc::now(),
            0,
            ChainHash::sentinel(),
        )
    }

    #[test]
    fn test_classification() {
        let layer = layer(None);
        assert!(layer.is_sensitive("credentials", EventLevel::Info));
        assert!(layer.is_sensitive("user_login", EventLevel::Error));
        assert!(layer.is_sensitive("user_login", EventLevel::Critical));
        assert!(!layer.is_sensitive("user_login", EventLevel::Warning));
    }

    #[test]
    fn test_only_audit_mode_seals() {
        let layer = layer(Some("enc-secret"));
        let data = json!({"token": "hunter2"});

        for mode in [AuditMode::Standard, AuditMode::Incident] {
            let payload = layer
                .prepare(mode, "credentials", EventLevel::Info, data.clone())
                .unwrap();
            assert_eq!(payload.as_plain(), Some(&data));
        }

        let payload = layer
            .prepare(AuditMode::Audit, "credentials", EventLevel::Info, data.clone())
            .unwrap();
        assert!(payload.is_sealed());

        let payload = layer
            .prepare(AuditMode::Audit, "user_login", EventLevel::Info, data)
            .unwrap();
        assert!(!payload.is_sealed());
    }

    #[test]
    fn test_seal_without_key_fails() {
        let layer = layer(None);
        let result = layer.prepare(AuditMode::Audit, "credentials", EventLevel::Info, json!({}));
        assert!(matches!(
            result,
            Err(AuditError::MissingEncryptionKey {
                mode: AuditMode::Audit
            })
        ));
    }

    #[test]
    fn test_sealed_bundle_hides_plaintext() {
        let layer = layer(Some("enc-secret"));
        let payload = layer
            .prepare(
                AuditMode::Audit,
                "credentials",
                EventLevel::Info,
                json!({"token": "hunter2"}),
            )
            .unwrap();
        let wire = serde_json::to_string(&payload).unwrap();
        assert!(!wire.contains("hunter2"));
        assert!(wire.contains("\"kind\":\"sealed\""));
    }

    #[test]
    fn test_reveal_round_trip() {
        let layer = layer(Some("enc-secret"));
        let data = json!({"token": "hunter2", "scopes": ["read", "write"]});
        let payload = layer
            .prepare(AuditMode::Audit, "credentials", EventLevel::Info, data.clone())
            .unwrap();
        let event = event_with(payload);

        assert_eq!(layer.reveal(AuditMode::Audit, &event).unwrap(), data);
    }

    #[test]
    fn test_reveal_with_wrong_key_fails() {
        let payload = layer(Some("enc-secret"))
            .prepare(AuditMode::Audit, "credentials", EventLevel::Info, json!(1))
            .unwrap();
        let event = event_with(payload);

        let result = layer(Some("other-secret")).reveal(AuditMode::Audit, &event);
        assert!(matches!(result, Err(AuditError::Crypto(_))));
    }

    #[test]
    fn test_reveal_plain_event_fails() {
        let event = event_with(EventPayload::plain(json!(1)));
        let result = layer(Some("enc-secret")).reveal(AuditMode::Audit, &event);
        assert!(matches!(result, Err(AuditError::NotEncrypted { .. })));
    }
}
