//! Error types for the identity module

use thiserror::Error;

use crate::ErrorKind;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IdentityError {
    /// Bad signature, malformed structure or claims, or an expiry in the past.
    #[error("Invalid token")]
    InvalidToken,

    /// Unknown login or wrong password. The two cases are not distinguished.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Registration for a login that already exists.
    #[error("User already exists: {login}")]
    UserExists { login: String },

    /// A required field was empty.
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    /// Signing secret shorter than the configured minimum.
    #[error("Signing secret must be at least {minimum} bytes, got {actual}")]
    WeakSigningSecret { minimum: usize, actual: usize },

    #[error("Token signing failed: {reason}")]
    SigningFailed { reason: String },
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::InvalidToken | IdentityError::InvalidCredentials => {
                ErrorKind::Unauthorized
            }
            IdentityError::UserExists { .. } => ErrorKind::Conflict,
            IdentityError::MissingField { .. } | IdentityError::WeakSigningSecret { .. } => {
                ErrorKind::Validation
            }
            IdentityError::SigningFailed { .. } => ErrorKind::Internal,
        }
    }
}
