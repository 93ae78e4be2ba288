//! AES-256-GCM sealing of vault payloads.
//!
//! Wire format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`, no
//! associated data.

use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, AeadCore, OsRng},
};
use zeroize::Zeroizing;

use super::errors::CryptoError;
use super::kdf::DerivedKey;
use crate::Result;

/// Nonce length for AES-GCM (12 bytes standard)
pub const NONCE_LENGTH: usize = 12;

/// Authentication tag length appended by AES-GCM
pub const TAG_LENGTH: usize = 16;

fn cipher_for(key: &DerivedKey) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|e| {
        CryptoError::EncryptionFailed {
            reason: format!("Failed to create cipher: {e}"),
        }
        .into()
    })
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// Two calls with the same inputs produce different outputs.
pub fn encrypt(plaintext: impl AsRef<[u8]>, key: &DerivedKey) -> Result<Vec<u8>> {
    let cipher = cipher_for(key)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let sealed = cipher
        .encrypt(&nonce, plaintext.as_ref())
        .map_err(|e| CryptoError::EncryptionFailed {
            reason: format!("Encryption failed: {e}"),
        })?;

    let mut blob = Vec::with_capacity(NONCE_LENGTH + sealed.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&sealed);
    Ok(blob)
}

/// Decrypt a blob produced by [`encrypt`].
///
/// Fails with [`CryptoError::AuthenticationFailed`] when the blob is shorter
/// than a nonce, the tag does not verify, or the key is wrong. Never returns
/// partial plaintext.
pub fn decrypt(blob: impl AsRef<[u8]>, key: &DerivedKey) -> Result<Zeroizing<Vec<u8>>> {
    let blob = blob.as_ref();
    if blob.len() < NONCE_LENGTH {
        return Err(CryptoError::AuthenticationFailed.into());
    }
    let (nonce, sealed) = blob.split_at(NONCE_LENGTH);

    let cipher = cipher_for(key)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    Ok(Zeroizing::new(plaintext))
}
