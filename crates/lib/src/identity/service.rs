//! Registration, authentication and token handling.

use std::sync::Arc;

use tracing::{info, warn};

use super::errors::IdentityError;
use super::token::TokenSigner;
use crate::Result;
use crate::backend::VaultBackend;
use crate::crypto::{hash_password, verify_password};
use crate::types::{NewUser, UserId};

/// Server-side account operations over a [`VaultBackend`].
#[derive(Clone)]
pub struct IdentityService {
    backend: Arc<dyn VaultBackend>,
    signer: TokenSigner,
}

impl IdentityService {
    pub fn new(backend: Arc<dyn VaultBackend>, signer: TokenSigner) -> Self {
        Self { backend, signer }
    }

    pub fn backend(&self) -> &Arc<dyn VaultBackend> {
        &self.backend
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Whether `login` is registered.
    ///
    /// This reveals account existence; it backs the sign-up pre-check only.
    pub async fn user_exists(&self, login: &str) -> Result<bool> {
        self.backend.user_exists(login).await
    }

    /// Create an account and return a token for it.
    ///
    /// The password is stored as an Argon2id hash. The seed is stored as
    /// given. Fails with [`IdentityError::UserExists`] if the login is taken,
    /// whether caught by the pre-check or by the store's uniqueness
    /// constraint when a concurrent registration wins.
    pub async fn register(&self, login: &str, password: &str, seed: &str) -> Result<String> {
        require("username", login)?;
        require("password", password)?;
        require("seed", seed)?;

        if self.backend.user_exists(login).await? {
            return Err(IdentityError::UserExists {
                login: login.to_string(),
            }
            .into());
        }

        let password_hash = hash_password(password)?;
        let user_id = match self
            .backend
            .create_user(NewUser::new(login, password_hash, seed))
            .await
        {
            Ok(id) => id,
            Err(e) if e.is_conflict() => {
                info!(login, "Registration lost a concurrent race for this login");
                return Err(IdentityError::UserExists {
                    login: login.to_string(),
                }
                .into());
            }
            Err(e) => return Err(e),
        };

        info!(%user_id, login, "Registered user");
        self.issue_token(user_id)
    }

    /// Check a login and password and return a fresh token.
    ///
    /// An unknown login and a wrong password both fail with
    /// [`IdentityError::InvalidCredentials`].
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<String> {
        let user = match self.backend.get_user_by_login(login).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                warn!(login, "Authentication failed");
                return Err(IdentityError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        match verify_password(password, &user.password_hash) {
            Ok(()) => {}
            Err(e) if e.is_unauthorized() => {
                warn!(login, "Authentication failed");
                return Err(IdentityError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        }

        info!(user_id = %user.id, "Authenticated user");
        self.issue_token(user.id)
    }

    pub fn issue_token(&self, user_id: UserId) -> Result<String> {
        self.signer.issue(user_id)
    }

    /// Verify a token without touching the store.
    pub fn verify_token(&self, token: &str) -> Result<UserId> {
        self.signer.verify(token)
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(IdentityError::MissingField { field }.into());
    }
    Ok(())
}
