//! Prelude module - commonly used types for convenient import.
//!
//! Use `use acey_audit::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use acey_audit::prelude::*;
//! use serde_json::json;
//!
//! let log = EnterpriseAuditLogger::standard();
//! let event = log.log("user_login", json!({"user": "a"}), EventLevel::Info).unwrap();
//! assert_eq!(event.sequence, 0);
//!
//! let result = log.verify_chain().unwrap();
//! assert!(result.valid);
//! ```

// Errors
pub use crate::{AuditError, AuditResult};

// Event types
pub use crate::{AuditEvent, EventId, EventLevel, EventPayload};

// Logger and configuration
pub use crate::{AuditMode, EnterpriseAuditLogger, LoggerConfig, RetentionStrategy};

// Verification, export and statistics
pub use crate::{
    AuditStatistics, ChainIssue, ChainVerificationResult, ExportDocument, ImportReport,
};
