//! Wire messages for the Keeper RPC surface.
//!
//! Every RPC is one variant of [`KeeperRequest`] answered by the matching
//! variant of [`KeeperResponse`]. Domain failures (bad credentials, expired
//! token, duplicate login) are ordinary responses with `success: false`, a
//! human-readable `message`, and a machine-readable [`ErrorCode`]. Only
//! genuine server faults travel as transport-level errors.
//!
//! Byte fields are base64 (standard alphabet, padded) inside the JSON.

use serde::{Deserialize, Serialize};

use crate::ErrorKind;
use crate::types::DataType;

/// Fixed user-facing messages.
pub mod messages {
    pub const USER_EXISTS: &str = "User already exists. Please Log in";
    pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
    pub const UNAUTHORIZED: &str = "Unauthorized";
    pub const USER_NOT_FOUND: &str = "User not found";
    pub const USER_REGISTERED: &str = "User registered successfully";
    pub const AUTHENTICATED: &str = "Authentication successful";
    pub const DATA_STORED: &str = "Data stored successfully";
    pub const DATA_RETRIEVED: &str = "Data retrieved successfully";
    pub const SEED_RETRIEVED: &str = "Master seed retrieved successfully";
    pub const INTERNAL_ERROR: &str = "Internal server error";
}

/// Machine-readable failure category carried by unsuccessful responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Conflict,
    NotFound,
    Unauthorized,
    Internal,
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => ErrorCode::Validation,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Unauthorized => ErrorCode::Unauthorized,
            ErrorKind::AuthenticationFailure | ErrorKind::Transport | ErrorKind::Internal => {
                ErrorCode::Internal
            }
        }
    }
}

/// Outcome fields shared by every response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
}

impl Status {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn failed(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserExistsRequest {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserExistsResponse {
    pub exists: bool,
    #[serde(flatten)]
    pub status: Status,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
    pub seed: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateUserRequest {
    pub username: String,
    pub password: String,
}

/// Answer to both `RegisterUser` and `AuthenticateUser`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: String,
    #[serde(flatten)]
    pub status: Status,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDataRequest {
    pub token: String,
    pub data_type: DataType,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(default)]
    pub metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDataResponse {
    #[serde(flatten)]
    pub status: Status,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveDataRequest {
    pub token: String,
    pub filter_type: DataType,
}

/// One stored entry as returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataItem {
    pub data_type: DataType,
    #[serde(default)]
    pub metadata: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveDataResponse {
    #[serde(default)]
    pub items: Vec<DataItem>,
    #[serde(flatten)]
    pub status: Status,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterSeedRetrieveRequest {
    pub token: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterSeedRetrieveResponse {
    #[serde(default)]
    pub master_seed: String,
    #[serde(flatten)]
    pub status: Status,
}

/// A request to the Keeper server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeeperRequest {
    UserExists(UserExistsRequest),
    RegisterUser(RegisterUserRequest),
    AuthenticateUser(AuthenticateUserRequest),
    StoreData(StoreDataRequest),
    RetrieveData(RetrieveDataRequest),
    MasterSeedRetrieve(MasterSeedRetrieveRequest),
}

impl KeeperRequest {
    /// RPC name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            KeeperRequest::UserExists(_) => "UserExists",
            KeeperRequest::RegisterUser(_) => "RegisterUser",
            KeeperRequest::AuthenticateUser(_) => "AuthenticateUser",
            KeeperRequest::StoreData(_) => "StoreData",
            KeeperRequest::RetrieveData(_) => "RetrieveData",
            KeeperRequest::MasterSeedRetrieve(_) => "MasterSeedRetrieve",
        }
    }
}

// Requests and token-bearing responses carry passwords, seeds or tokens;
// keep them out of logs.
impl std::fmt::Debug for KeeperRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeeperRequest::{}", self.name())
    }
}

impl std::fmt::Debug for RegisterUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUserRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for AuthenticateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticateUserRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for StoreDataRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreDataRequest")
            .field("data_type", &self.data_type)
            .field("data_len", &self.data.len())
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for RetrieveDataRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrieveDataRequest")
            .field("filter_type", &self.filter_type)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for MasterSeedRetrieveRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSeedRetrieveRequest")
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for MasterSeedRetrieveResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSeedRetrieveResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// A response from the Keeper server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeeperResponse {
    UserExists(UserExistsResponse),
    RegisterUser(TokenResponse),
    AuthenticateUser(TokenResponse),
    StoreData(StoreDataResponse),
    RetrieveData(RetrieveDataResponse),
    MasterSeedRetrieve(MasterSeedRetrieveResponse),
}

impl KeeperResponse {
    /// RPC name, for logging and mismatch reports.
    pub fn name(&self) -> &'static str {
        match self {
            KeeperResponse::UserExists(_) => "UserExists",
            KeeperResponse::RegisterUser(_) => "RegisterUser",
            KeeperResponse::AuthenticateUser(_) => "AuthenticateUser",
            KeeperResponse::StoreData(_) => "StoreData",
            KeeperResponse::RetrieveData(_) => "RetrieveData",
            KeeperResponse::MasterSeedRetrieve(_) => "MasterSeedRetrieve",
        }
    }

    pub fn status(&self) -> &Status {
        match self {
            KeeperResponse::UserExists(r) => &r.status,
            KeeperResponse::RegisterUser(r) | KeeperResponse::AuthenticateUser(r) => &r.status,
            KeeperResponse::StoreData(r) => &r.status,
            KeeperResponse::RetrieveData(r) => &r.status,
            KeeperResponse::MasterSeedRetrieve(r) => &r.status,
        }
    }
}

/// Body of an HTTP 500 answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFault {
    pub message: String,
}

/// Serde adapter encoding `Vec<u8>` as a base64 string.
pub(crate) mod base64_bytes {
    use base64ct::{Base64, Encoding};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Base64::encode_string(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Base64::decode_vec(&encoded).map_err(serde::de::Error::custom)
    }
}
