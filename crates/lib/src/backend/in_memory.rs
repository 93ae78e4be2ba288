//! In-memory vault backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use super::{BackendError, VaultBackend};
use crate::Result;
use crate::clock::{Clock, SystemClock};
use crate::types::{DataType, NewUser, NewVaultEntry, User, UserId, VaultEntry};

#[derive(Debug, Default)]
struct Users {
    by_id: BTreeMap<UserId, User>,
    by_login: HashMap<String, UserId>,
    last_id: i64,
}

/// A backend that keeps everything in process memory.
///
/// Data is lost when the instance is dropped. The login uniqueness check and
/// the insert run under the same write lock, so concurrent registrations for
/// one login resolve to exactly one winner, as with the SQL backends.
///
/// **Security Note**: master seeds and password hashes sit in memory as
/// plain strings. Fine for tests and development.
#[derive(Debug)]
pub struct InMemory {
    users: RwLock<Users>,
    entries: RwLock<Vec<VaultEntry>>,
    clock: Arc<dyn Clock>,
}

impl InMemory {
    /// Creates a new, empty backend using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a new, empty backend that timestamps entries with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: RwLock::new(Users::default()),
            entries: RwLock::new(Vec::new()),
            clock,
        }
    }

    /// Number of registered users.
    pub fn user_count(&self) -> Result<usize> {
        Ok(self.read_users()?.by_id.len())
    }

    /// Number of stored entries across all owners.
    pub fn entry_count(&self) -> Result<usize> {
        Ok(self.read_entries()?.len())
    }

    fn read_users(&self) -> Result<RwLockReadGuard<'_, Users>> {
        self.users
            .read()
            .map_err(|_| BackendError::LockPoisoned.into())
    }

    fn write_users(&self) -> Result<RwLockWriteGuard<'_, Users>> {
        self.users
            .write()
            .map_err(|_| BackendError::LockPoisoned.into())
    }

    fn read_entries(&self) -> Result<RwLockReadGuard<'_, Vec<VaultEntry>>> {
        self.entries
            .read()
            .map_err(|_| BackendError::LockPoisoned.into())
    }

    fn write_entries(&self) -> Result<RwLockWriteGuard<'_, Vec<VaultEntry>>> {
        self.entries
            .write()
            .map_err(|_| BackendError::LockPoisoned.into())
    }
}

impl Default for InMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VaultBackend for InMemory {
    async fn user_exists(&self, login: &str) -> Result<bool> {
        Ok(self.read_users()?.by_login.contains_key(login))
    }

    async fn create_user(&self, user: NewUser) -> Result<UserId> {
        let mut users = self.write_users()?;
        if users.by_login.contains_key(&user.login) {
            return Err(BackendError::LoginTaken { login: user.login }.into());
        }

        users.last_id += 1;
        let id = UserId(users.last_id);
        users.by_login.insert(user.login.clone(), id);
        users.by_id.insert(id, user.into_user(id));
        debug!(user_id = %id, "Created user");
        Ok(id)
    }

    async fn get_user_by_login(&self, login: &str) -> Result<User> {
        let users = self.read_users()?;
        users
            .by_login
            .get(login)
            .and_then(|id| users.by_id.get(id))
            .cloned()
            .ok_or_else(|| {
                BackendError::LoginNotFound {
                    login: login.to_string(),
                }
                .into()
            })
    }

    async fn store_entry(&self, entry: NewVaultEntry) -> Result<VaultEntry> {
        if !self.read_users()?.by_id.contains_key(&entry.owner_id) {
            return Err(BackendError::UnknownOwner {
                owner_id: entry.owner_id,
            }
            .into());
        }

        let mut entries = self.write_entries()?;
        let id = entries.len() as i64 + 1;
        let stored = entry.into_entry(id, self.clock.now());
        entries.push(stored.clone());
        debug!(entry_id = id, owner_id = %stored.owner_id, data_type = %stored.data_type, "Stored entry");
        Ok(stored)
    }

    async fn retrieve_entries(
        &self,
        owner_id: UserId,
        data_type: DataType,
    ) -> Result<Vec<VaultEntry>> {
        let entries = self.read_entries()?;
        Ok(entries
            .iter()
            .filter(|e| e.owner_id == owner_id && e.data_type == data_type)
            .cloned()
            .collect())
    }

    async fn get_master_seed(&self, user_id: UserId) -> Result<String> {
        self.read_users()?
            .by_id
            .get(&user_id)
            .map(|user| user.master_seed.clone())
            .ok_or_else(|| BackendError::UserNotFound { id: user_id }.into())
    }
}
