//! Error types for the crypto module
use thiserror::Error;

use crate::ErrorKind;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CryptoError {
    /// Tag mismatch, wrong key, or a blob too short to hold a nonce.
    ///
    /// Deliberately carries no detail: callers must not be able to tell
    /// these cases apart.
    #[error("Ciphertext authentication failed")]
    AuthenticationFailed,

    #[error("Encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    #[error("Key derivation failed: {reason}")]
    KeyDerivationFailed { reason: String },

    #[error("Password hashing failed: {reason}")]
    PasswordHashFailed { reason: String },

    /// The supplied password does not match the stored hash.
    #[error("Invalid password")]
    InvalidPassword,

    /// The stored hash could not be parsed.
    #[error("Stored password hash is malformed")]
    MalformedPasswordHash,
}

impl CryptoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CryptoError::AuthenticationFailed => ErrorKind::AuthenticationFailure,
            CryptoError::InvalidPassword => ErrorKind::Unauthorized,
            CryptoError::EncryptionFailed { .. }
            | CryptoError::KeyDerivationFailed { .. }
            | CryptoError::PasswordHashFailed { .. }
            | CryptoError::MalformedPasswordHash => ErrorKind::Internal,
        }
    }
}
