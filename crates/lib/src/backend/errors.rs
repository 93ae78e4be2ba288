//! Error types for vault storage backends.

use thiserror::Error;

use crate::ErrorKind;
use crate::types::UserId;

/// Errors that can occur during backend operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// Another user already holds this login.
    ///
    /// Raised by the store's own uniqueness check, so it also covers the
    /// loser of a concurrent registration race.
    #[error("Login already taken: {login}")]
    LoginTaken {
        /// The login that was requested
        login: String,
    },

    /// No user has this login.
    #[error("User not found: {login}")]
    LoginNotFound {
        /// The login that was looked up
        login: String,
    },

    /// No user has this id.
    #[error("User not found: id {id}")]
    UserNotFound {
        /// The id that was looked up
        id: UserId,
    },

    /// A vault entry referenced an owner that does not exist.
    #[error("Unknown entry owner: id {owner_id}")]
    UnknownOwner {
        /// The owner id carried by the entry
        owner_id: UserId,
    },

    /// A stored row carried a data type code outside the known range.
    #[error("Invalid data type code in storage: {code}")]
    InvalidDataType {
        /// The raw code read from the store
        code: i64,
    },

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("Backend lock poisoned")]
    LockPoisoned,

    /// SQL database operation failed.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Description of what failed
        reason: String,
        /// The underlying sqlx error, if available
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl BackendError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BackendError::LoginNotFound { .. }
                | BackendError::UserNotFound { .. }
                | BackendError::UnknownOwner { .. }
        )
    }

    /// Check if this error indicates a uniqueness conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, BackendError::LoginTaken { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        if self.is_conflict() {
            ErrorKind::Conflict
        } else if self.is_not_found() {
            ErrorKind::NotFound
        } else {
            ErrorKind::Internal
        }
    }
}
