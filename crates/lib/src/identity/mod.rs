//! Accounts and session tokens
//!
//! [`IdentityService`] registers and authenticates users against a
//! [`VaultBackend`](crate::backend::VaultBackend) and hands out tokens signed
//! by a [`TokenSigner`]. Token verification is pure: it never touches the
//! store.

mod errors;
mod service;
mod token;

pub use errors::IdentityError;
pub use service::IdentityService;
pub use token::{Claims, TokenSigner};
