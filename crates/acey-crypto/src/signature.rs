//! Event signatures.
//!
//! A signature covers an event's 32-byte chain hash and travels as
//! standard base64 in exports.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

const SIGNATURE_LEN: usize = 64;

/// Ed25519 signature over a chain hash.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    pub(crate) fn from_dalek(signature: &ed25519_dalek::Signature) -> Self {
        Self(signature.to_bytes())
    }

    pub(crate) fn check(&self, message: &[u8], key: &VerifyingKey) -> CryptoResult<()> {
        key.verify(message, &ed25519_dalek::Signature::from_bytes(&self.0))
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&STANDARD.encode(self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = STANDARD.encode(self.0);
        write!(f, "Signature({}..)", encoded.get(..12).unwrap_or(&encoded))
    }
}

impl FromStr for Signature {
    type Err = CryptoError;

    fn from_str(s: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(s)
            .map_err(|_| CryptoError::InvalidBase64Encoding)?;
        let raw: [u8; SIGNATURE_LEN] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidSignatureLength {
                    expected: SIGNATURE_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(raw))
    }
}

impl Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        encoded.parse().map_err(serde::de::Error::custom)
    }
}
