//! Two-step save and retrieve workflows.
//!
//! Typed intermediate states keep the derived key scoped to one operation:
//!
//! ```text
//! begin_save ──► SaveWorkflow { key } ──seal──► PendingSave { ciphertext } ──commit──► stored
//! begin_retrieve ──► RetrieveWorkflow { key } ──fetch──► Vec<RetrievedItem>
//! ```
//!
//! Each state is consumed by its transition, so the key is dropped (and
//! zeroized) as soon as it is no longer needed.

use tracing::debug;
use zeroize::Zeroizing;

use super::{KeeperClient, Secret, Session};
use crate::Result;
use crate::crypto::{DerivedKey, decrypt, encrypt};
use crate::transport::KeeperTransport;
use crate::types::DataType;

/// A save in progress: the key has been derived, nothing is encrypted yet.
pub struct SaveWorkflow<'a, T> {
    client: &'a KeeperClient<T>,
    session: &'a Session,
    key: DerivedKey,
}

impl<'a, T: KeeperTransport> SaveWorkflow<'a, T> {
    pub(super) fn new(client: &'a KeeperClient<T>, session: &'a Session, key: DerivedKey) -> Self {
        Self {
            client,
            session,
            key,
        }
    }

    /// Encrypt `secret` locally. The key is discarded on return.
    pub fn seal(self, secret: &Secret, metadata: impl Into<String>) -> Result<PendingSave<'a, T>> {
        secret.validate()?;
        let plaintext = secret.to_plaintext()?;
        self.seal_bytes(secret.data_type(), &plaintext, metadata)
    }

    /// Encrypt raw bytes tagged as `data_type`. The key is discarded on return.
    pub fn seal_bytes(
        self,
        data_type: DataType,
        plaintext: &[u8],
        metadata: impl Into<String>,
    ) -> Result<PendingSave<'a, T>> {
        let data = encrypt(plaintext, &self.key)?;
        Ok(PendingSave {
            client: self.client,
            session: self.session,
            data_type,
            data,
            metadata: metadata.into(),
        })
    }
}

/// Ciphertext ready to be stored. No key material remains.
pub struct PendingSave<'a, T> {
    client: &'a KeeperClient<T>,
    session: &'a Session,
    data_type: DataType,
    data: Vec<u8>,
    metadata: String,
}

impl<T: KeeperTransport> PendingSave<'_, T> {
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// The sealed bytes that `commit` will send.
    pub fn ciphertext(&self) -> &[u8] {
        &self.data
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    /// Send the ciphertext to the server.
    ///
    /// The server re-verifies the session; if the token expired since the
    /// seed was fetched this fails as unauthorized and nothing is stored.
    pub async fn commit(self) -> Result<()> {
        let size = self.data.len();
        self.client
            .store_raw(self.session, self.data_type, self.data, self.metadata)
            .await?;
        debug!(data_type = %self.data_type, size, "Saved entry");
        Ok(())
    }
}

/// A decrypted vault entry.
pub struct RetrievedItem {
    pub data_type: DataType,
    pub metadata: String,
    pub plaintext: Zeroizing<Vec<u8>>,
}

impl RetrievedItem {
    /// Parse the plaintext as a typed [`Secret`].
    pub fn secret(&self) -> Result<Secret> {
        Secret::from_plaintext(self.data_type, &self.plaintext)
    }
}

impl std::fmt::Debug for RetrievedItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievedItem")
            .field("data_type", &self.data_type)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// A retrieval in progress: the key has been derived, nothing fetched yet.
pub struct RetrieveWorkflow<'a, T> {
    client: &'a KeeperClient<T>,
    session: &'a Session,
    key: DerivedKey,
}

impl<'a, T: KeeperTransport> RetrieveWorkflow<'a, T> {
    pub(super) fn new(client: &'a KeeperClient<T>, session: &'a Session, key: DerivedKey) -> Self {
        Self {
            client,
            session,
            key,
        }
    }

    /// Fetch the entries of `data_type` and decrypt them locally.
    ///
    /// Aborts on the first entry that fails authentication; no partial
    /// results are returned.
    pub async fn fetch(self, data_type: DataType) -> Result<Vec<RetrievedItem>> {
        let items = self.client.retrieve_raw(self.session, data_type).await?;
        let mut retrieved = Vec::with_capacity(items.len());
        for item in items {
            let plaintext = decrypt(&item.data, &self.key)?;
            retrieved.push(RetrievedItem {
                data_type: item.data_type,
                metadata: item.metadata,
                plaintext,
            });
        }
        debug!(%data_type, count = retrieved.len(), "Retrieved entries");
        Ok(retrieved)
    }
}
