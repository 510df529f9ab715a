//! Prelude module - commonly used types for convenient import.
//!
//! Use `use acey_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Hashing
pub use crate::{ChainHash, ChainHasher};

// Signing
pub use crate::{KeyPair, PublicKey, Signature};

// Sealing
pub use crate::{AuditCipher, SealedBundle};
