//! Core data types shared by the backend, the service and the client.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId(id)
    }
}

/// Kind of secret held in a vault entry.
///
/// The server treats this as an opaque filter; only the client uses it to
/// re-hydrate decrypted payloads. The numeric codes are stable: they are the
/// wire tag and what the SQL backends persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum DataType {
    Credentials,
    Text,
    Binary,
    Card,
}

impl DataType {
    /// All data types in code order.
    pub const ALL: [DataType; 4] = [
        DataType::Credentials,
        DataType::Text,
        DataType::Binary,
        DataType::Card,
    ];

    /// Stable numeric code (`CREDENTIALS=1` .. `CARD=4`).
    pub fn code(self) -> i64 {
        match self {
            DataType::Credentials => 1,
            DataType::Text => 2,
            DataType::Binary => 3,
            DataType::Card => 4,
        }
    }

    /// Inverse of [`DataType::code`].
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(DataType::Credentials),
            2 => Some(DataType::Text),
            3 => Some(DataType::Binary),
            4 => Some(DataType::Card),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Credentials => "CREDENTIALS",
            DataType::Text => "TEXT",
            DataType::Binary => "BINARY",
            DataType::Card => "CARD",
        }
    }
}

impl From<DataType> for i64 {
    fn from(data_type: DataType) -> Self {
        data_type.code()
    }
}

impl TryFrom<i64> for DataType {
    type Error = String;

    fn try_from(code: i64) -> std::result::Result<Self, Self::Error> {
        DataType::from_code(code).ok_or_else(|| format!("unknown data type code {code}"))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered user as persisted by a backend.
///
/// `master_seed` is stored as supplied at registration. It is not sealed
/// server-side.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub login: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub master_seed: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("password_hash", &"<redacted>")
            .field("master_seed", &"<redacted>")
            .finish()
    }
}

/// A user about to be inserted; the backend assigns the id.
#[derive(Clone)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
    pub master_seed: String,
}

impl NewUser {
    pub fn new(
        login: impl Into<String>,
        password_hash: impl Into<String>,
        master_seed: impl Into<String>,
    ) -> Self {
        Self {
            login: login.into(),
            password_hash: password_hash.into(),
            master_seed: master_seed.into(),
        }
    }

    /// Attach the id assigned by the store.
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            login: self.login,
            password_hash: self.password_hash,
            master_seed: self.master_seed,
        }
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

/// One stored, owner-scoped record. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEntry {
    pub id: i64,
    pub owner_id: UserId,
    pub data_type: DataType,
    /// Opaque bytes; ciphertext when produced by a correct client.
    pub data: Vec<u8>,
    /// Free-text label, stored unencrypted.
    pub metadata: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A vault entry about to be stored.
///
/// `owner_id` is always taken from a verified token by the service layer,
/// never from the request body.
#[derive(Debug, Clone)]
pub struct NewVaultEntry {
    pub owner_id: UserId,
    pub data_type: DataType,
    pub data: Vec<u8>,
    pub metadata: String,
}

impl NewVaultEntry {
    pub fn new(
        owner_id: UserId,
        data_type: DataType,
        data: Vec<u8>,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            owner_id,
            data_type,
            data,
            metadata: metadata.into(),
        }
    }

    /// Materialize with the id and timestamp assigned by the store.
    pub fn into_entry(self, id: i64, now: DateTime<Utc>) -> VaultEntry {
        VaultEntry {
            id,
            owner_id: self.owner_id,
            data_type: self.data_type,
            data: self.data,
            metadata: self.metadata,
            created_at: now,
            modified_at: now,
        }
    }
}
