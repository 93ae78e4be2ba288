//! Error types for the client module

use std::time::Duration;

use thiserror::Error;

use crate::ErrorKind;
use crate::protocol::{ErrorCode, Status};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ClientError {
    /// A required field was empty; no call was made.
    #[error("{field} must not be empty")]
    MissingField { field: &'static str },

    /// The server rejected the request as malformed.
    #[error("{message}")]
    Rejected { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    NotFound { message: String },

    /// Bad credentials, or a missing, invalid or expired token.
    #[error("{message}")]
    Unauthorized { message: String },

    /// The server failed internally.
    #[error("Server error: {message}")]
    Server { message: String },

    /// The RPC did not complete within the client timeout.
    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Transport error: {reason}")]
    Transport { reason: String },

    /// The server answered a different RPC than the one called.
    #[error("Unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        expected: &'static str,
        actual: &'static str,
    },

    /// A decrypted payload did not match its declared data type.
    #[error("Invalid payload: {reason}")]
    InvalidPayload { reason: String },
}

impl ClientError {
    /// Build the error for an unsuccessful response.
    pub fn from_status(status: &Status) -> Self {
        let message = status.message.clone();
        match status.error {
            Some(ErrorCode::Validation) => ClientError::Rejected { message },
            Some(ErrorCode::Conflict) => ClientError::Conflict { message },
            Some(ErrorCode::NotFound) => ClientError::NotFound { message },
            Some(ErrorCode::Unauthorized) => ClientError::Unauthorized { message },
            Some(ErrorCode::Internal) | None => ClientError::Server { message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::MissingField { .. } | ClientError::Rejected { .. } => {
                ErrorKind::Validation
            }
            ClientError::Conflict { .. } => ErrorKind::Conflict,
            ClientError::NotFound { .. } => ErrorKind::NotFound,
            ClientError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ClientError::Timeout { .. }
            | ClientError::Transport { .. }
            | ClientError::UnexpectedResponse { .. } => ErrorKind::Transport,
            ClientError::Server { .. } | ClientError::InvalidPayload { .. } => ErrorKind::Internal,
        }
    }
}
