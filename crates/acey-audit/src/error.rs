//! Audit-related error types.

use thiserror::Error;

use crate::mode::AuditMode;

/// Errors that can occur with audit logging.
///
/// Chain integrity problems are not errors: they are reported as
/// [`ChainIssue`](crate::ChainIssue) values by verification.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The mode signs events but no signing key is configured.
    #[error("{mode} mode requires a signing key")]
    MissingSigningKey {
        /// Mode that needed the key.
        mode: AuditMode,
    },

    /// The mode encrypts sensitive events but no encryption key is configured.
    #[error("{mode} mode requires an encryption key")]
    MissingEncryptionKey {
        /// Mode that needed the key.
        mode: AuditMode,
    },

    /// The log was created immutable and the operation would discard events.
    #[error("audit log is immutable")]
    ImmutableLog,

    /// Invalid logger configuration.
    #[error("invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// Offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Crypto error.
    #[error("crypto error: {0}")]
    Crypto(#[from] acey_crypto::CryptoError),

    /// Internal lock was poisoned by a panicking writer.
    #[error("audit state lock poisoned: {0}")]
    LockPoisoned(String),

    /// Decryption was requested for a plaintext event.
    #[error("audit event {event_id} is not encrypted")]
    NotEncrypted {
        /// The plaintext event.
        event_id: String,
    },
}

impl From<serde_json::Error> for AuditError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
