//! Cryptographic primitives
//!
//! Provides:
//! - PBKDF2-HMAC-SHA256 seed-to-key derivation ([`derive_key`])
//! - AES-256-GCM sealing of vault payloads ([`encrypt`], [`decrypt`])
//! - Argon2id password hashing ([`hash_password`], [`verify_password`])
//!
//! Key derivation and sealing run on the client. Password hashing runs on
//! the server.

mod cipher;
mod errors;
mod kdf;
mod password;

pub use cipher::{NONCE_LENGTH, TAG_LENGTH, decrypt, encrypt};
pub use errors::CryptoError;
pub use kdf::{DerivedKey, KEY_LENGTH, derive_key};
pub use password::{hash_password, verify_password};
