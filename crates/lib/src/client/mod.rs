//! Client side of the vault
//!
//! [`KeeperClient`] wraps a [`KeeperTransport`] and turns RPC responses into
//! `Result`s. The authenticated state is an explicit [`Session`] value the
//! caller holds and passes into each call; there is no process-wide session.
//!
//! Saving and retrieving need two independent RPCs each (fetch the master
//! seed, then store or retrieve), with the key derived locally in between.
//! [`SaveWorkflow`] and [`RetrieveWorkflow`] make that sequence explicit:
//!
//! ```ignore
//! let session = client.authenticate("alice", "pw").await?;
//!
//! let pending = client
//!     .begin_save(&session)
//!     .await?                              // seed fetched, key derived
//!     .seal(&Secret::text("hello"), "note")?; // encrypted, key dropped
//! pending.commit().await?;                 // ciphertext stored
//!
//! let items = client.begin_retrieve(&session).await?.fetch(DataType::Text).await?;
//! ```
//!
//! A failure at any step leaves nothing behind: the key only lives inside the
//! workflow value and no entry exists until `commit` succeeds.

mod errors;
mod secret;
mod workflow;

use zeroize::Zeroizing;

use crate::Result;
use crate::config::KdfParams;
use crate::crypto::{DerivedKey, derive_key};
use crate::protocol::{
    AuthenticateUserRequest, DataItem, KeeperRequest, KeeperResponse,
    MasterSeedRetrieveRequest, RegisterUserRequest, RetrieveDataRequest, Status,
    StoreDataRequest, UserExistsRequest, messages,
};
use crate::transport::KeeperTransport;
use crate::types::DataType;

pub use errors::ClientError;
pub use secret::Secret;
pub use workflow::{PendingSave, RetrieveWorkflow, RetrievedItem, SaveWorkflow};

use secret::require;

/// An authenticated session: the token returned by register or login.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    /// Wrap a previously issued token.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        require("token", &token)?;
        Ok(Self { token })
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Session(<redacted>)")
    }
}

/// Typed client for a Keeper server.
pub struct KeeperClient<T> {
    transport: T,
    kdf: KdfParams,
}

impl<T: KeeperTransport> KeeperClient<T> {
    /// Client using the default key-derivation parameters.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            kdf: KdfParams::default(),
        }
    }

    /// Derive keys with `kdf` instead of the defaults.
    ///
    /// Every client of one account must use the same parameters, or entries
    /// saved by one cannot be read by another.
    pub fn with_kdf_params(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn kdf_params(&self) -> &KdfParams {
        &self.kdf
    }

    /// Whether `username` is registered.
    pub async fn user_exists(&self, username: &str) -> Result<bool> {
        require("username", username)?;
        let request = KeeperRequest::UserExists(UserExistsRequest {
            username: username.to_string(),
        });
        match self.transport.call(request).await? {
            KeeperResponse::UserExists(r) => {
                check(&r.status)?;
                Ok(r.exists)
            }
            other => Err(unexpected("UserExists", &other)),
        }
    }

    /// Register a new account and return its session.
    pub async fn register(&self, username: &str, password: &str, seed: &str) -> Result<Session> {
        require("username", username)?;
        require("password", password)?;
        require("seed", seed)?;

        let request = KeeperRequest::RegisterUser(RegisterUserRequest {
            username: username.to_string(),
            password: password.to_string(),
            seed: seed.to_string(),
        });
        match self.transport.call(request).await? {
            KeeperResponse::RegisterUser(r) => {
                check(&r.status)?;
                Session::new(r.token)
            }
            other => Err(unexpected("RegisterUser", &other)),
        }
    }

    /// The interactive sign-up flow: check the login is free, then register.
    ///
    /// The existence check is only a courtesy; the server still rejects a
    /// login registered in the meantime.
    pub async fn sign_up(&self, username: &str, password: &str, seed: &str) -> Result<Session> {
        require("username", username)?;
        require("password", password)?;
        require("seed", seed)?;

        if self.user_exists(username).await? {
            return Err(ClientError::Conflict {
                message: messages::USER_EXISTS.to_string(),
            }
            .into());
        }
        self.register(username, password, seed).await
    }

    /// Log in and return a fresh session.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Session> {
        require("username", username)?;
        require("password", password)?;

        let request = KeeperRequest::AuthenticateUser(AuthenticateUserRequest {
            username: username.to_string(),
            password: password.to_string(),
        });
        match self.transport.call(request).await? {
            KeeperResponse::AuthenticateUser(r) => {
                check(&r.status)?;
                Session::new(r.token)
            }
            other => Err(unexpected("AuthenticateUser", &other)),
        }
    }

    /// Fetch the session owner's master seed.
    pub async fn master_seed(&self, session: &Session) -> Result<Zeroizing<String>> {
        let request = KeeperRequest::MasterSeedRetrieve(MasterSeedRetrieveRequest {
            token: session.token.clone(),
        });
        match self.transport.call(request).await? {
            KeeperResponse::MasterSeedRetrieve(r) => {
                check(&r.status)?;
                Ok(Zeroizing::new(r.master_seed))
            }
            other => Err(unexpected("MasterSeedRetrieve", &other)),
        }
    }

    /// Store already-sealed bytes. Prefer [`KeeperClient::save`].
    pub async fn store_raw(
        &self,
        session: &Session,
        data_type: DataType,
        data: Vec<u8>,
        metadata: impl Into<String>,
    ) -> Result<()> {
        let request = KeeperRequest::StoreData(StoreDataRequest {
            token: session.token.clone(),
            data_type,
            data,
            metadata: metadata.into(),
        });
        match self.transport.call(request).await? {
            KeeperResponse::StoreData(r) => check(&r.status),
            other => Err(unexpected("StoreData", &other)),
        }
    }

    /// Fetch the session owner's sealed entries of `data_type`, in insertion order.
    pub async fn retrieve_raw(&self, session: &Session, data_type: DataType) -> Result<Vec<DataItem>> {
        let request = KeeperRequest::RetrieveData(RetrieveDataRequest {
            token: session.token.clone(),
            filter_type: data_type,
        });
        match self.transport.call(request).await? {
            KeeperResponse::RetrieveData(r) => {
                check(&r.status)?;
                Ok(r.items)
            }
            other => Err(unexpected("RetrieveData", &other)),
        }
    }

    /// Fetch the seed and derive this session's key.
    async fn session_key(&self, session: &Session) -> Result<DerivedKey> {
        let seed = self.master_seed(session).await?;
        derive_key(seed.as_bytes(), &self.kdf)
    }

    /// Start a save: fetch the master seed and derive the key.
    pub async fn begin_save<'a>(&'a self, session: &'a Session) -> Result<SaveWorkflow<'a, T>> {
        let key = self.session_key(session).await?;
        Ok(SaveWorkflow::new(self, session, key))
    }

    /// Start a retrieval: fetch the master seed and derive the key.
    pub async fn begin_retrieve<'a>(
        &'a self,
        session: &'a Session,
    ) -> Result<RetrieveWorkflow<'a, T>> {
        let key = self.session_key(session).await?;
        Ok(RetrieveWorkflow::new(self, session, key))
    }

    /// Encrypt and store `secret` under a plaintext `metadata` label.
    pub async fn save(
        &self,
        session: &Session,
        secret: &Secret,
        metadata: impl Into<String>,
    ) -> Result<()> {
        secret.validate()?;
        self.begin_save(session)
            .await?
            .seal(secret, metadata)?
            .commit()
            .await
    }

    /// Fetch and decrypt every entry of `data_type`.
    pub async fn retrieve(&self, session: &Session, data_type: DataType) -> Result<Vec<RetrievedItem>> {
        self.begin_retrieve(session).await?.fetch(data_type).await
    }
}

fn check(status: &Status) -> Result<()> {
    if status.success {
        Ok(())
    } else {
        Err(ClientError::from_status(status).into())
    }
}

fn unexpected(expected: &'static str, actual: &KeeperResponse) -> crate::Error {
    ClientError::UnexpectedResponse {
        expected,
        actual: actual.name(),
    }
    .into()
}
