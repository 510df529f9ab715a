//! Acey Audit - Hash-chained, mode-aware immutable audit logging.
//!
//! This crate provides:
//! - Chain-linked events (each contains the hash of the previous)
//! - Three operating modes: standard, audit, incident
//! - Signing and selective payload encryption in audit mode
//! - Skill gating and risky-operation interception in incident mode
//! - Chain integrity verification, retention, export and import
//!
//! # Security Model
//!
//! Every event is:
//! - Hashed over a canonical field tuple with BLAKE3
//! - Linked to the previous event via that hash
//! - Signed with Ed25519 when a signing key is in play
//! - Sealed with AES-256-GCM when it is sensitive and the log is in audit mode
//!
//! The chain linking provides tamper evidence - any modification,
//! reordering or deletion of historical events breaks the chain and is
//! detectable.
//!
//! # Example
//!
//! ```
//! use acey_audit::{AuditMode, EnterpriseAuditLogger, EventLevel};
//! use serde_json::json;
//!
//! let log = EnterpriseAuditLogger::standard();
//! log.log("login_attempt", json!({"user": "a"}), EventLevel::Info).unwrap();
//!
//! log.set_mode(AuditMode::Incident).unwrap();
//! assert!(!log.is_skill_allowed("deploy"));
//!
//! assert!(log.verify_chain_integrity());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod chain;
mod confidentiality;
mod config;
mod error;
mod event;
mod export;
mod logger;
mod mode;
mod retention;
mod stats;

pub use chain::{
    ChainIssue, ChainState, ChainVerificationResult, HashChain, RETENTION_TRIMMED,
};
pub use confidentiality::Confidentiality;
pub use config::{
    AUDIT_RETENTION_DAYS, Catalogues, INCIDENT_RETENTION_DAYS, LoggerConfig,
    STANDARD_RETENTION_DAYS,
};
pub use error::{AuditError, AuditResult};
pub use event::{AuditEvent, EVENT_HASH_DOMAIN, EventDraft, EventId, EventLevel, EventPayload};
pub use export::{ExportDocument, ExportMetadata, ImportReport};
pub use logger::{
    EnterpriseAuditLogger, INCIDENT_MODE_DISABLED, INCIDENT_MODE_ENABLED, MODE_CHANGED,
    RISKY_OPERATION_BLOCKED,
};
pub use mode::{AuditMode, Interception, ModeController, ModeTransition};
pub use retention::{RetentionPolicy, RetentionStrategy};
pub use stats::AuditStatistics;
