//! Compact signed session tokens.
//!
//! Tokens are JWTs signed with HMAC-SHA256 (`alg: HS256`) carrying
//! `{user_id, exp}`, where `exp` is in seconds since the Unix epoch.

use std::sync::Arc;
use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::warn;

use super::errors::IdentityError;
use crate::Result;
use crate::clock::Clock;
use crate::config::{SecurityConfig, SigningKeys};
use crate::types::UserId;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

/// The claims carried by a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Issues and verifies session tokens.
///
/// Signs with the current secret from [`SigningKeys`]; verifies against the
/// current secret and every previous one.
#[derive(Debug, Clone)]
pub struct TokenSigner {
    keys: SigningKeys,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenSigner {
    pub fn new(config: &SecurityConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            keys: config.signing_keys.clone(),
            ttl: config.token_ttl,
            clock,
        }
    }

    /// Lifetime of newly issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id` expiring one TTL from now.
    pub fn issue(&self, user_id: UserId) -> Result<String> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| self.clock.now_secs().checked_add(ttl))
            .ok_or_else(|| IdentityError::SigningFailed {
                reason: format!("token lifetime of {}s overflows expiry", self.ttl.as_secs()),
            })?;
        self.sign(&Claims { user_id, exp })
    }

    /// Sign arbitrary claims with the current secret.
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        };
        let header = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&header)?);
        let payload = Base64UrlUnpadded::encode_string(&serde_json::to_vec(claims)?);
        let signing_input = format!("{header}.{payload}");

        let mut mac = mac_for(self.keys.current())?;
        mac.update(signing_input.as_bytes());
        let signature = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify `token` and return the user it was issued to.
    ///
    /// Fails with [`IdentityError::InvalidToken`] on a bad signature,
    /// malformed structure or claims, or when `exp` is not in the future.
    pub fn verify(&self, token: &str) -> Result<UserId> {
        match self.check(token) {
            Ok(claims) => Ok(claims.user_id),
            Err(reason) => {
                warn!(reason, "Rejected token");
                Err(IdentityError::InvalidToken.into())
            }
        }
    }

    fn check(&self, token: &str) -> std::result::Result<Claims, &'static str> {
        let (signing_input, signature) = token.rsplit_once('.').ok_or("malformed")?;
        let (header, payload) = signing_input.split_once('.').ok_or("malformed")?;
        if payload.contains('.') {
            return Err("malformed");
        }

        let header: Header = decode_json(header).ok_or("malformed header")?;
        if header.alg != ALGORITHM {
            return Err("unsupported algorithm");
        }

        let signature = Base64UrlUnpadded::decode_vec(signature).map_err(|_| "malformed")?;
        let signed_by_known_key = self.keys.accepted().any(|key| {
            mac_for(key)
                .map(|mut mac| {
                    mac.update(signing_input.as_bytes());
                    mac.verify_slice(&signature).is_ok()
                })
                .unwrap_or(false)
        });
        if !signed_by_known_key {
            return Err("bad signature");
        }

        let claims: Claims = decode_json(payload).ok_or("malformed claims")?;
        if claims.exp <= self.clock.now_secs() {
            return Err("expired");
        }
        Ok(claims)
    }
}

fn mac_for(key: &[u8]) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(key).map_err(|e| {
        IdentityError::SigningFailed {
            reason: e.to_string(),
        }
        .into()
    })
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Option<T> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}
