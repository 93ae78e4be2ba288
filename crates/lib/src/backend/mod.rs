//! Storage backends for users and vault entries
//!
//! The [`VaultBackend`] trait is the only way the rest of the crate touches
//! persistent state. Two implementations ship:
//!
//! - [`InMemory`]: `RwLock`-guarded maps, for tests and throwaway servers
//! - [`SqlxBackend`]: SQLite or PostgreSQL through sqlx's `AnyPool`
//!
//! Users and entries are immutable once created, so every operation is a
//! single-row create or a read. Login uniqueness is enforced inside the store
//! itself; a caller's `user_exists` pre-check is advisory only.

use async_trait::async_trait;

use crate::Result;
use crate::types::{DataType, NewUser, NewVaultEntry, User, UserId, VaultEntry};

mod errors;
mod in_memory;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod sql;

pub use errors::BackendError;
pub use in_memory::InMemory;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use sql::{DbKind, SqlxBackend};

/// Owner-scoped storage contract for the vault.
///
/// All implementations must be `Send` and `Sync` so a single instance can be
/// shared by concurrent request handlers.
#[async_trait]
pub trait VaultBackend: Send + Sync {
    /// Whether a user with this login exists.
    async fn user_exists(&self, login: &str) -> Result<bool>;

    /// Insert a new user and return the id the store assigned.
    ///
    /// Fails with [`BackendError::LoginTaken`] if the login is already
    /// registered, including when a concurrent insert wins the race.
    async fn create_user(&self, user: NewUser) -> Result<UserId>;

    /// Look a user up by login.
    ///
    /// Fails with [`BackendError::LoginNotFound`] when absent.
    async fn get_user_by_login(&self, login: &str) -> Result<User>;

    /// Persist a vault entry, stamping id and timestamps.
    async fn store_entry(&self, entry: NewVaultEntry) -> Result<VaultEntry>;

    /// All of `owner_id`'s entries of `data_type`, in insertion order.
    ///
    /// Returns an empty vector, not an error, when nothing matches.
    async fn retrieve_entries(&self, owner_id: UserId, data_type: DataType)
    -> Result<Vec<VaultEntry>>;

    /// The master seed stored for `user_id`.
    ///
    /// Fails with [`BackendError::UserNotFound`] when the user is unknown.
    async fn get_master_seed(&self, user_id: UserId) -> Result<String>;
}
