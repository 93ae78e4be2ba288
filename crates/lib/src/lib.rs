//!
//! Keeper: store small secrets on a server that only ever holds ciphertext.
//!
//! ## Core Concepts
//!
//! * **Users (`types::User`)**: registered accounts with an Argon2 password hash and a master seed.
//! * **Vault entries (`types::VaultEntry`)**: immutable, owner-scoped records whose `data` is
//!   ciphertext produced by the client.
//! * **Backends (`backend::VaultBackend`)**: pluggable persistence. `InMemory` for tests and
//!   ephemeral deployments, `SqlxBackend` for SQLite and PostgreSQL.
//! * **Identity (`identity::IdentityService`)**: registration, authentication and signed,
//!   stateless session tokens.
//! * **Crypto (`crypto`)**: seed-to-key derivation and AES-256-GCM sealing. These run on the
//!   client only; the server never derives keys or sees plaintext.
//! * **Service and transport (`service`, `transport`)**: the RPC surface and its HTTP/JSON
//!   rendition.
//! * **Client (`client`)**: sessions and the typed save/retrieve workflows that tie the
//!   independent RPCs together.

pub mod backend;
pub mod client;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod types;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use config::{KdfParams, SecurityConfig, SigningKeys};
pub use types::{DataType, User, UserId, VaultEntry};

/// Result type used throughout the Keeper library.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure categories shared by the server and the client.
///
/// Every [`Error`] maps onto exactly one of these via [`Error::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required field was empty or malformed; caught before any call.
    Validation,
    /// The login is already registered.
    Conflict,
    /// Unknown user or seed.
    NotFound,
    /// Bad or expired token, or bad credentials.
    Unauthorized,
    /// Ciphertext failed authentication.
    AuthenticationFailure,
    /// The RPC never produced an answer.
    Transport,
    /// Store failure unrelated to the above.
    Internal,
}

/// Common error type for the Keeper library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured errors from the crypto module
    #[error(transparent)]
    Crypto(crypto::CryptoError),

    /// Structured errors from the identity module
    #[error(transparent)]
    Identity(identity::IdentityError),

    /// Structured errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured errors from the client module
    #[error(transparent)]
    Client(client::ClientError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Crypto(_) => "crypto",
            Error::Identity(_) => "identity",
            Error::Backend(_) => "backend",
            Error::Client(_) => "client",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Classify this error into the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Crypto(err) => err.kind(),
            Error::Identity(err) => err.kind(),
            Error::Backend(err) => err.kind(),
            Error::Client(err) => err.kind(),
            Error::Io(_) => ErrorKind::Internal,
            Error::Serialize(_) => ErrorKind::Validation,
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Check if this error means the caller is not (or no longer) authenticated.
    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    /// Check if this error is a ciphertext authentication failure.
    pub fn is_authentication_failure(&self) -> bool {
        self.kind() == ErrorKind::AuthenticationFailure
    }

    /// Check if this error is validation-related.
    pub fn is_validation_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Check if this error came from the transport rather than the server.
    pub fn is_transport_error(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Check if this error is database/backend-related.
    pub fn is_database_error(&self) -> bool {
        matches!(self, Error::Backend(_))
    }
}

impl From<crypto::CryptoError> for Error {
    fn from(err: crypto::CryptoError) -> Self {
        Error::Crypto(err)
    }
}

impl From<identity::IdentityError> for Error {
    fn from(err: identity::IdentityError) -> Self {
        Error::Identity(err)
    }
}

impl From<backend::BackendError> for Error {
    fn from(err: backend::BackendError) -> Self {
        Error::Backend(err)
    }
}

impl From<client::ClientError> for Error {
    fn from(err: client::ClientError) -> Self {
        Error::Client(err)
    }
}
