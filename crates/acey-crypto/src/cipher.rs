//! AES-256-GCM sealing for sensitive event payloads.
//!
//! The symmetric key is derived from a configured secret with Argon2id.
//! The derivation salt is fixed: every deployment that shares a secret
//! shares a key. Changing the salt would make previously sealed payloads
//! unreadable, so it is versioned in the constant name instead.

use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use argon2::Argon2;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Fixed Argon2id salt for payload key derivation.
const KDF_SALT_V1: &[u8] = b"acey-audit-kdf-salt-v1";

/// Separator between the hex-encoded parts of a [`SealedBundle`].
const BUNDLE_DELIMITER: char = ':';

/// Symmetric cipher bound to key material derived from a configured secret.
pub struct AuditCipher {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl AuditCipher {
    /// Derive the payload key from a secret string.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyDerivationFailed`] if Argon2 rejects the input.
    pub fn from_secret(secret: &str) -> CryptoResult<Self> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        Argon2::default()
            .hash_password_into(secret.as_bytes(), KDF_SALT_V1, key.as_mut_slice())
            .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
        Ok(Self { key })
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EncryptionFailed`] if the AEAD backend fails.
    pub fn seal(&self, plaintext: &[u8]) -> CryptoResult<SealedBundle> {
        let cipher = self.aead()?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        // aes-gcm appends the tag to the ciphertext.
        let mut sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        let split_at = sealed
            .len()
            .checked_sub(TAG_LEN)
            .ok_or(CryptoError::EncryptionFailed)?;
        let tag_bytes = sealed.split_off(split_at);
        let tag: [u8; TAG_LEN] = tag_bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(SealedBundle {
            nonce,
            ciphertext: sealed,
            tag,
        })
    }

    /// Decrypt and authenticate a bundle.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptionFailed`] on a wrong key or a
    /// tampered bundle.
    pub fn open(&self, bundle: &SealedBundle) -> CryptoResult<Vec<u8>> {
        let cipher = self.aead()?;

        let mut combined = Vec::with_capacity(bundle.ciphertext.len().saturating_add(TAG_LEN));
        combined.extend_from_slice(&bundle.ciphertext);
        combined.extend_from_slice(&bundle.tag);

        cipher
            .decrypt(Nonce::from_slice(&bundle.nonce), combined.as_slice())
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    fn aead(&self) -> CryptoResult<Aes256Gcm> {
        Aes256Gcm::new_from_slice(self.key.as_slice()).map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: self.key.len(),
        })
    }
}

impl fmt::Debug for AuditCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditCipher").finish_non_exhaustive()
    }
}

/// Self-describing ciphertext: `nonce:ciphertext:tag`, each part hex-encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedBundle {
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
    tag: [u8; TAG_LEN],
}

impl SealedBundle {
    /// The random nonce used for this bundle.
    #[must_use]
    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// The ciphertext without the tag.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// The GCM authentication tag.
    #[must_use]
    pub fn tag(&self) -> &[u8; TAG_LEN] {
        &self.tag
    }
}

impl fmt::Display for SealedBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{BUNDLE_DELIMITER}{}{BUNDLE_DELIMITER}{}",
            hex::encode(self.nonce),
            hex::encode(&self.ciphertext),
            hex::encode(self.tag)
        )
    }
}

impl fmt::Debug for SealedBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedBundle")
            .field("nonce", &hex::encode(self.nonce))
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

impl FromStr for SealedBundle {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(BUNDLE_DELIMITER);
        let (Some(nonce_hex), Some(ct_hex), Some(tag_hex), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CryptoError::MalformedBundle(
                "expected exactly three delimited parts".to_string(),
            ));
        };

        let mut nonce = [0u8; NONCE_LEN];
        hex::decode_to_slice(nonce_hex, &mut nonce)
            .map_err(|e| CryptoError::MalformedBundle(format!("nonce: {e}")))?;
        let ciphertext = hex::decode(ct_hex)
            .map_err(|e| CryptoError::MalformedBundle(format!("ciphertext: {e}")))?;
        let mut tag = [0u8; TAG_LEN];
        hex::decode_to_slice(tag_hex, &mut tag)
            .map_err(|e| CryptoError::MalformedBundle(format!("tag: {e}")))?;

        Ok(Self {
            nonce,
            ciphertext,
            tag,
        })
    }
}

impl Serialize for SealedBundle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SealedBundle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
