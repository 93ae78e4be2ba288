//! Seed-to-key derivation.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::errors::CryptoError;
use crate::Result;
use crate::config::KdfParams;

/// Derived key length for AES-256 (32 bytes)
pub const KEY_LENGTH: usize = 32;

/// A symmetric key derived from a master seed.
///
/// Wiped from memory on drop and never serialized. It lives only inside a
/// single client workflow.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LENGTH]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl From<[u8; KEY_LENGTH]> for DerivedKey {
    fn from(bytes: [u8; KEY_LENGTH]) -> Self {
        DerivedKey(bytes)
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive a 32-byte key from a master seed using PBKDF2-HMAC-SHA256.
///
/// Deterministic: the same seed and parameters always yield the same key.
/// The salt is application-wide, not per user.
pub fn derive_key(seed: impl AsRef<[u8]>, params: &KdfParams) -> Result<DerivedKey> {
    if params.iterations == 0 {
        return Err(CryptoError::KeyDerivationFailed {
            reason: "iteration count must be at least 1".to_string(),
        }
        .into());
    }

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(seed.as_ref(), &params.salt, params.iterations, &mut key);
    let derived = DerivedKey(key);
    key.zeroize();
    Ok(derived)
}
