//! Config file to running logger.

use std::collections::HashMap;
use std::io::Write as _;

use acey_audit::{AuditMode, EnterpriseAuditLogger, EventLevel, LoggerConfig, RetentionStrategy};
use acey_config::Config;
use serde_json::json;

#[test]
fn config_file_builds_an_audit_logger() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[audit]
mode = "audit"
retention_days = 90
retention_strategy = "wall_clock"
encryption_key = "file-encryption-secret"
signature_key = "file-signature-secret"
sensitive_types = ["payroll"]

[logging]
level = "debug"
"#
    )
    .unwrap();

    let config = Config::load_file(file.path()).unwrap();
    let logger_config = LoggerConfig::from_section(&config.audit).unwrap();
    assert_eq!(logger_config.mode, AuditMode::Audit);
    assert_eq!(logger_config.retention_days, 90);
    assert_eq!(logger_config.retention_strategy, RetentionStrategy::WallClock);

    let log = EnterpriseAuditLogger::new(logger_config).unwrap();
    let payroll = log.log("payroll", json!({"amount": 1}), EventLevel::Info).unwrap();
    let login = log.log("credentials", json!({}), EventLevel::Info).unwrap();

    assert!(payroll.encrypted);
    assert!(!login.encrypted, "catalogue from the file replaces the defaults");
    assert!(payroll.is_signed());
    assert!(log.verify_chain_integrity());
}

#[test]
fn env_fills_secrets_the_file_leaves_out() {
    let env: HashMap<String, String> = [
        ("ACEY_AUDIT_ENCRYPTION_KEY", "env-encryption-secret"),
        ("ACEY_AUDIT_SIGNATURE_KEY", "env-signature-secret"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();

    let config =
        acey_config::loader::from_toml_str_with_env("[audit]\nmode = \"audit\"\n", &env).unwrap();
    let log = EnterpriseAuditLogger::new(LoggerConfig::from_section(&config.audit).unwrap())
        .unwrap();

    assert_eq!(log.mode().unwrap(), AuditMode::Audit);
    assert!(log.public_key().is_some());
    assert!(
        log.log("credentials", json!({}), EventLevel::Info)
            .unwrap()
            .encrypted
    );
}

#[test]
fn file_values_win_over_env() {
    let env: HashMap<String, String> = [("ACEY_AUDIT_MODE", "incident")]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

    let config =
        acey_config::loader::from_toml_str_with_env("[audit]\nmode = \"standard\"\n", &env)
            .unwrap();
    let log = EnterpriseAuditLogger::new(LoggerConfig::from_section(&config.audit).unwrap())
        .unwrap();
    assert_eq!(log.mode().unwrap(), AuditMode::Standard);
}

#[test]
fn audit_mode_without_secrets_fails_validation() {
    let result = acey_config::loader::from_toml_str_with_env(
        "[audit]\nmode = \"audit\"\n",
        &HashMap::<String, String>::new(),
    );
    assert!(result.is_err());
}

#[test]
fn empty_config_yields_the_standard_preset() {
    let config =
        acey_config::loader::from_toml_str_with_env("", &HashMap::<String, String>::new())
            .unwrap();
    let logger_config = LoggerConfig::from_section(&config.audit).unwrap();
    let preset = LoggerConfig::standard();

    assert_eq!(logger_config.mode, preset.mode);
    assert_eq!(logger_config.retention_days, preset.retention_days);
    assert_eq!(logger_config.immutable, preset.immutable);
    assert_eq!(logger_config.catalogues, preset.catalogues);
}
