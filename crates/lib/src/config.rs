//! Injected security configuration.
//!
//! The server needs token signing material and a token lifetime; the client
//! needs the key-derivation parameters. Neither is compiled in: the binary
//! builds these from flags/environment and hands them down.
//!
//! ## Rotating the signing secret
//!
//! [`SigningKeys`] holds one *current* secret and any number of *previous*
//! secrets. Tokens are always signed with the current secret; verification
//! accepts any of them. To rotate:
//!
//! 1. Start the server with the new secret as current and the old one listed
//!    as previous. Outstanding tokens keep verifying.
//! 2. After one token lifetime has elapsed, drop the old secret from the
//!    previous list. Tokens signed with it stop verifying.

use std::time::Duration;

use rand::RngCore;
use zeroize::Zeroizing;

use crate::Result;
use crate::identity::IdentityError;

/// Minimum signing secret length in bytes (HMAC-SHA256 block strength).
pub const MIN_SIGNING_SECRET_LENGTH: usize = 32;

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest token lifetime the server will configure.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Application-wide KDF salt shipped by earlier clients.
///
/// Every client must derive with the same salt or previously stored entries
/// become undecryptable, so this stays the default until a migration exists.
pub const LEGACY_KDF_SALT: &[u8] = b"LOnhFQ:zixsQ";

/// Default PBKDF2 iteration count.
pub const DEFAULT_KDF_ITERATIONS: u32 = 4096;

/// Token signing secrets: the one used to sign and the ones still accepted.
#[derive(Clone)]
pub struct SigningKeys {
    current: Zeroizing<Vec<u8>>,
    previous: Vec<Zeroizing<Vec<u8>>>,
}

impl SigningKeys {
    /// Build from the current signing secret.
    pub fn new(current: impl Into<Vec<u8>>) -> Result<Self> {
        let current = Zeroizing::new(current.into());
        check_secret_length(&current)?;
        Ok(Self {
            current,
            previous: Vec::new(),
        })
    }

    /// Accept tokens signed with an older secret during a rotation window.
    pub fn with_previous(mut self, previous: impl Into<Vec<u8>>) -> Result<Self> {
        let previous = Zeroizing::new(previous.into());
        check_secret_length(&previous)?;
        self.previous.push(previous);
        Ok(self)
    }

    /// Generate a random, process-local secret. Tokens will not survive a restart.
    pub fn generate() -> Self {
        let mut secret = Zeroizing::new(vec![0u8; MIN_SIGNING_SECRET_LENGTH]);
        rand::rngs::OsRng.fill_bytes(&mut secret);
        Self {
            current: secret,
            previous: Vec::new(),
        }
    }

    pub(crate) fn current(&self) -> &[u8] {
        &self.current
    }

    /// Current secret first, then previous secrets in the order they were added.
    pub(crate) fn accepted(&self) -> impl Iterator<Item = &[u8]> {
        std::iter::once(self.current.as_slice()).chain(self.previous.iter().map(|s| s.as_slice()))
    }
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("previous", &self.previous.len())
            .finish_non_exhaustive()
    }
}

fn check_secret_length(secret: &[u8]) -> Result<()> {
    if secret.len() < MIN_SIGNING_SECRET_LENGTH {
        return Err(IdentityError::WeakSigningSecret {
            minimum: MIN_SIGNING_SECRET_LENGTH,
            actual: secret.len(),
        }
        .into());
    }
    Ok(())
}

/// Server-side security settings.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub signing_keys: SigningKeys,
    pub token_ttl: Duration,
}

impl SecurityConfig {
    pub fn new(signing_keys: SigningKeys) -> Self {
        Self {
            signing_keys,
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }
}

/// Client-side key derivation parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct KdfParams {
    pub salt: Vec<u8>,
    pub iterations: u32,
}

impl KdfParams {
    pub fn new(salt: impl Into<Vec<u8>>, iterations: u32) -> Self {
        Self {
            salt: salt.into(),
            iterations,
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::new(LEGACY_KDF_SALT, DEFAULT_KDF_ITERATIONS)
    }
}

impl std::fmt::Debug for KdfParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KdfParams")
            .field("salt_len", &self.salt.len())
            .field("iterations", &self.iterations)
            .finish()
    }
}
