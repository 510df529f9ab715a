//! Mode behaviour: signing, sealing, skill gating and risky-operation blocking.

use acey_audit::{
    AuditError, AuditMode, ChainIssue, EnterpriseAuditLogger, EventLevel, EventPayload,
    INCIDENT_MODE_DISABLED, INCIDENT_MODE_ENABLED, LoggerConfig, MODE_CHANGED,
    RISKY_OPERATION_BLOCKED,
};
use serde_json::json;

const ENC: &str = "integration-encryption-secret";
const SIG: &str = "integration-signature-secret";

fn audit_logger() -> EnterpriseAuditLogger {
    EnterpriseAuditLogger::audit(ENC, SIG).unwrap()
}

// ---------------------------------------------------------------------------
// Audit mode
// ---------------------------------------------------------------------------

#[test]
fn audit_mode_signs_everything_and_seals_sensitive_events() {
    let log = audit_logger();
    let secret = json!({"user": "ops", "key": "sk-live-123"});

    let sealed = log
        .log("credentials", secret.clone(), EventLevel::Info)
        .unwrap();
    let routine = log
        .log("user_login", json!({"user": "ops"}), EventLevel::Info)
        .unwrap();
    let severe = log
        .log("disk_failure", json!({"disk": "sda"}), EventLevel::Error)
        .unwrap();

    assert!(sealed.encrypted);
    assert!(sealed.data.is_sealed());
    assert!(!routine.encrypted);
    assert_eq!(routine.data, EventPayload::plain(json!({"user": "ops"})));
    assert!(severe.encrypted);

    for event in [&sealed, &routine, &severe] {
        assert!(event.is_signed());
        event.verify_signature(&log.public_key().unwrap()).unwrap();
    }

    let exported = log.export_json(false).unwrap();
    assert!(!exported.contains("sk-live-123"));

    assert_eq!(log.decrypt_event(&sealed).unwrap(), secret);
    assert!(matches!(
        log.decrypt_event(&routine),
        Err(AuditError::NotEncrypted { .. })
    ));
    assert!(log.verify_chain_integrity());
}

#[test]
fn signing_key_is_derived_from_the_configured_secret() {
    let log = audit_logger();
    let expected = acey_crypto::KeyPair::from_secret_material(SIG).export_public_key();
    assert_eq!(log.public_key(), Some(expected));

    let event = log.log("user_login", json!({}), EventLevel::Info).unwrap();
    event.verify_signature(&expected).unwrap();
}

#[test]
fn signatures_fail_under_a_different_key() {
    let source = audit_logger();
    source
        .log("user_login", json!({"user": "ops"}), EventLevel::Info)
        .unwrap();

    let inspector = EnterpriseAuditLogger::new(
        LoggerConfig::standard().with_signature_key("some-other-secret"),
    )
    .unwrap();
    assert!(inspector.import(&source.export_json(false).unwrap()).success);

    let result = inspector.verify_chain().unwrap();
    assert!(!result.valid);
    assert!(
        result
            .issues
            .iter()
            .any(|issue| matches!(issue, ChainIssue::InvalidSignature { .. }))
    );
}

#[test]
fn signatures_without_a_key_are_counted_not_failed() {
    let source = audit_logger();
    source.log("user_login", json!({}), EventLevel::Info).unwrap();
    source.log("user_logout", json!({}), EventLevel::Info).unwrap();

    let inspector = EnterpriseAuditLogger::standard();
    assert!(inspector.import(&source.export_json(false).unwrap()).success);

    let result = inspector.verify_chain().unwrap();
    assert!(result.valid);
    assert_eq!(result.unverified_signatures, 2);
}

#[test]
fn sealed_payload_needs_the_right_key() {
    let source = audit_logger();
    let sealed = source
        .log("api_keys", json!({"key": "abc"}), EventLevel::Info)
        .unwrap();

    let wrong = EnterpriseAuditLogger::new(
        LoggerConfig::standard().with_encryption_key("not-the-encryption-secret"),
    )
    .unwrap();
    assert!(matches!(
        wrong.decrypt_event(&sealed),
        Err(AuditError::Crypto(_))
    ));

    let keyless = EnterpriseAuditLogger::standard();
    assert!(matches!(
        keyless.decrypt_event(&sealed),
        Err(AuditError::MissingEncryptionKey { .. })
    ));
}

#[test]
fn audit_mode_without_keys_is_rejected_at_construction() {
    let result = EnterpriseAuditLogger::new(LoggerConfig::standard().with_mode(AuditMode::Audit));
    assert!(matches!(result, Err(AuditError::MissingSigningKey { .. })));

    let result = EnterpriseAuditLogger::new(
        LoggerConfig::standard()
            .with_mode(AuditMode::Audit)
            .with_signature_key(SIG),
    );
    assert!(matches!(
        result,
        Err(AuditError::MissingEncryptionKey { .. })
    ));
}

#[test]
fn failed_switch_to_audit_changes_nothing() {
    let log = EnterpriseAuditLogger::standard();
    log.log("user_login", json!({}), EventLevel::Info).unwrap();

    assert!(log.set_mode(AuditMode::Audit).is_err());
    assert_eq!(log.mode().unwrap(), AuditMode::Standard);
    assert_eq!(log.len().unwrap(), 1);
    assert!(log.verify_chain_integrity());
}

// ---------------------------------------------------------------------------
// Incident mode
// ---------------------------------------------------------------------------

#[test]
fn incident_round_trip_records_transitions_in_order() {
    let log = EnterpriseAuditLogger::standard();

    let entered = log.set_mode(AuditMode::Incident).unwrap();
    let types: Vec<_> = entered.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, [INCIDENT_MODE_ENABLED, MODE_CHANGED]);
    assert_eq!(entered[0].level, EventLevel::Critical);
    assert_eq!(
        entered[0].data.as_plain().unwrap()["previousMode"],
        json!("standard")
    );
    assert_eq!(
        entered[1].data.as_plain().unwrap(),
        &json!({"from": "standard", "to": "incident"})
    );

    let disabled = log.disabled_skills().unwrap();
    assert_eq!(disabled, ["config_change", "deploy", "file_write", "system_modify"]);
    for skill in &disabled {
        assert!(!log.is_skill_allowed(skill));
    }

    let left = log.set_mode(AuditMode::Standard).unwrap();
    let types: Vec<_> = left.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, [INCIDENT_MODE_DISABLED, MODE_CHANGED]);
    assert_eq!(left[0].level, EventLevel::Warning);
    assert_eq!(
        left[0].data.as_plain().unwrap()["reenabledSkills"],
        json!(disabled)
    );
    assert!(log.disabled_skills().unwrap().is_empty());
    assert!(log.is_skill_allowed("deploy"));

    assert_eq!(log.len().unwrap(), 4);
    assert!(log.verify_chain_integrity());
}

#[test]
fn repeated_mode_is_a_no_op() {
    let log = EnterpriseAuditLogger::incident();
    assert!(log.set_mode(AuditMode::Incident).unwrap().is_empty());
    assert!(log.is_empty().unwrap());
    assert!(!log.is_skill_allowed("deploy"));
}

#[test]
fn risky_operations_are_recorded_and_flagged() {
    let log = EnterpriseAuditLogger::incident();

    let original = log
        .log("skill_execution", json!({"skill": "deploy"}), EventLevel::Info)
        .unwrap();
    assert!(original.blocked);

    let events = log.events().unwrap();
    assert_eq!(events.len(), 2);
    let notice = &events[1];
    assert_eq!(notice.event_type, RISKY_OPERATION_BLOCKED);
    assert_eq!(notice.level, EventLevel::Critical);
    assert_eq!(notice.sequence, original.sequence + 1);
    assert_eq!(
        notice.data.as_plain().unwrap()["originalEventId"],
        json!(original.id.to_string())
    );
    assert_eq!(
        notice.data.as_plain().unwrap()["originalType"],
        json!("skill_execution")
    );

    let routine = log.log("user_login", json!({}), EventLevel::Info).unwrap();
    assert!(!routine.blocked);
    assert_eq!(log.len().unwrap(), 3);

    let stats = log.statistics().unwrap();
    assert_eq!(stats.blocked_events, 1);
    assert_eq!(stats.by_type[RISKY_OPERATION_BLOCKED], 1);
    assert!(stats.chain_valid);
}

#[test]
fn risky_operations_pass_outside_incident_mode() {
    let log = EnterpriseAuditLogger::standard();
    let event = log
        .log("skill_execution", json!({}), EventLevel::Info)
        .unwrap();
    assert!(!event.blocked);
    assert_eq!(log.len().unwrap(), 1);
}

#[test]
fn incident_mode_signs_only_with_a_key() {
    let unsigned = EnterpriseAuditLogger::incident();
    let event = unsigned
        .log("user_login", json!({}), EventLevel::Info)
        .unwrap();
    assert!(!event.is_signed());

    let signed = EnterpriseAuditLogger::new(LoggerConfig::incident().with_signature_key(SIG))
        .unwrap();
    let event = signed.log("user_login", json!({}), EventLevel::Info).unwrap();
    assert!(event.is_signed());
    assert!(signed.verify_chain_integrity());
}

#[test]
fn leaving_audit_mode_stops_signing() {
    let log = audit_logger();
    let changed = log.set_mode(AuditMode::Standard).unwrap();
    assert!(changed.iter().all(|e| !e.is_signed()));

    let event = log.log("user_login", json!({}), EventLevel::Info).unwrap();
    assert!(!event.is_signed());
    assert!(!event.encrypted);
    assert!(log.verify_chain_integrity());
}
