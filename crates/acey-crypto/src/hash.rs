//! Chain hashing using BLAKE3.
//!
//! Every audit event is reduced to a [`ChainHash`] through a [`ChainHasher`],
//! which frames each field with its name and length so that two different
//! field tuples can never produce the same byte stream.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a chain hash in bytes.
pub const HASH_LEN: usize = 32;

/// A BLAKE3 digest linking one audit event to the next.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainHash([u8; HASH_LEN]);

impl ChainHash {
    /// Hash arbitrary data.
    #[must_use]
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Hash data under a derivation context (domain separation).
    #[must_use]
    pub fn hash_with_domain(domain: &str, data: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(domain);
        hasher.update(data);
        Self(*hasher.finalize().as_bytes())
    }

    /// The empty-chain sentinel (all zero bytes).
    ///
    /// Used as `previous_hash` of the first event of a fresh chain.
    #[must_use]
    pub const fn sentinel() -> Self {
        Self([0u8; HASH_LEN])
    }

    /// Check if this is the empty-chain sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }

    /// Get the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Create from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Encode as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid hex or not 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; HASH_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ChainHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ChainHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Default for ChainHash {
    fn default() -> Self {
        Self::sentinel()
    }
}

impl AsRef<[u8]> for ChainHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Incremental hasher producing a [`ChainHash`] over named fields.
///
/// Each field is written as `len(name) || name || len(value) || value` with
/// little-endian `u64` lengths, so field order is part of the digest.
///
/// ```
/// use acey_crypto::ChainHasher;
///
/// let a = ChainHasher::new("ctx").field("type", b"login").finish();
/// let b = ChainHasher::new("ctx").field("type", b"logout").finish();
/// assert_ne!(a, b);
/// ```
pub struct ChainHasher {
    inner: blake3::Hasher,
}

impl ChainHasher {
    /// Start a hasher bound to a derivation context.
    #[must_use]
    pub fn new(domain: &str) -> Self {
        Self {
            inner: blake3::Hasher::new_derive_key(domain),
        }
    }

    /// Append a named field.
    #[must_use]
    pub fn field(mut self, name: &str, value: &[u8]) -> Self {
        self.write_framed(name.as_bytes());
        self.write_framed(value);
        self
    }

    /// Append a named `u64` field (little-endian).
    #[must_use]
    pub fn field_u64(self, name: &str, value: u64) -> Self {
        self.field(name, &value.to_le_bytes())
    }

    /// Finish and return the digest.
    #[must_use]
    pub fn finish(self) -> ChainHash {
        ChainHash(*self.inner.finalize().as_bytes())
    }

    fn write_framed(&mut self, bytes: &[u8]) {
        // usize -> u64 never truncates on supported targets.
        let len = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        self.inner.update(&len.to_le_bytes());
        self.inner.update(bytes);
    }
}

impl fmt::Debug for ChainHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainHasher").finish_non_exhaustive()
    }
}
