//! Acey Crypto - Cryptographic primitives for the immutable audit ledger.
//!
//! This crate provides:
//! - BLAKE3 chain hashes with domain separation and a zero sentinel
//! - Ed25519 key pairs for signing chain hashes
//! - AES-256-GCM sealing of sensitive payloads with Argon2id key derivation
//!
//! The audit crate only talks to these types, so the underlying algorithms
//! can change without touching the chain engine.
//!
//! # Example
//!
//! ```
//! use acey_crypto::{AuditCipher, ChainHash, KeyPair};
//!
//! let keypair = KeyPair::generate();
//! let hash = ChainHash::hash_with_domain("example", b"payload");
//! let signature = keypair.sign(hash.as_bytes());
//! assert!(keypair.verify(hash.as_bytes(), &signature).is_ok());
//!
//! let cipher = AuditCipher::from_secret("correct horse battery staple").unwrap();
//! let bundle = cipher.seal(b"secret").unwrap();
//! assert_eq!(cipher.open(&bundle).unwrap(), b"secret");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod cipher;
mod error;
mod hash;
mod keypair;
mod signature;

pub use cipher::{AuditCipher, SealedBundle};
pub use error::{CryptoError, CryptoResult};
pub use hash::{ChainHash, ChainHasher};
pub use keypair::{KeyPair, PublicKey};
pub use signature::Signature;
