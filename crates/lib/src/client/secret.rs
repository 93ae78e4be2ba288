//! Typed plaintext payloads.
//!
//! A [`Secret`] is what the user actually wants to keep. It is serialized to
//! JSON on the client, sealed, and only the ciphertext leaves the process.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::errors::ClientError;
use crate::Result;
use crate::types::DataType;

/// One secret payload. The variant determines the entry's [`DataType`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Secret {
    Credentials {
        login: String,
        password: String,
    },
    Text {
        text: String,
    },
    Binary {
        file_name: String,
        #[serde(with = "crate::protocol::base64_bytes")]
        content: Vec<u8>,
    },
    Card {
        #[serde(alias = "card_number")]
        number: String,
        #[serde(alias = "expiration_date")]
        expiration: String,
        cvv: String,
    },
}

/// Binary payload as written by earlier clients: the source path and the
/// file bytes as a (lossy) string.
#[derive(Deserialize)]
struct LegacyBinary {
    file_path: String,
    #[serde(default)]
    file_data: String,
}

impl From<LegacyBinary> for Secret {
    fn from(legacy: LegacyBinary) -> Self {
        let file_name = std::path::Path::new(&legacy.file_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or(legacy.file_path);
        Secret::Binary {
            file_name,
            content: legacy.file_data.into_bytes(),
        }
    }
}

impl Secret {
    pub fn credentials(login: impl Into<String>, password: impl Into<String>) -> Self {
        Secret::Credentials {
            login: login.into(),
            password: password.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Secret::Text { text: text.into() }
    }

    pub fn binary(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Secret::Binary {
            file_name: file_name.into(),
            content,
        }
    }

    pub fn card(
        number: impl Into<String>,
        expiration: impl Into<String>,
        cvv: impl Into<String>,
    ) -> Self {
        Secret::Card {
            number: number.into(),
            expiration: expiration.into(),
            cvv: cvv.into(),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Secret::Credentials { .. } => DataType::Credentials,
            Secret::Text { .. } => DataType::Text,
            Secret::Binary { .. } => DataType::Binary,
            Secret::Card { .. } => DataType::Card,
        }
    }

    /// Check required fields are non-empty. Binary content may be empty.
    pub fn validate(&self) -> Result<()> {
        match self {
            Secret::Credentials { login, password } => {
                require("login", login)?;
                require("password", password)
            }
            Secret::Text { text } => require("text", text),
            Secret::Binary { file_name, .. } => require("file_name", file_name),
            Secret::Card {
                number,
                expiration,
                cvv,
            } => {
                require("number", number)?;
                require("expiration", expiration)?;
                require("cvv", cvv)
            }
        }
    }

    /// JSON plaintext, wiped when dropped.
    pub(crate) fn to_plaintext(&self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(serde_json::to_vec(self)?))
    }

    /// Parse decrypted plaintext declared as `data_type`.
    pub fn from_plaintext(data_type: DataType, plaintext: &[u8]) -> Result<Self> {
        let secret = match serde_json::from_slice::<Secret>(plaintext) {
            Ok(secret) => secret,
            Err(e) => match data_type {
                DataType::Binary => serde_json::from_slice::<LegacyBinary>(plaintext)
                    .map(Secret::from)
                    .map_err(|_| ClientError::InvalidPayload {
                        reason: e.to_string(),
                    })?,
                _ => {
                    return Err(ClientError::InvalidPayload {
                        reason: e.to_string(),
                    }
                    .into());
                }
            },
        };
        if secret.data_type() != data_type {
            return Err(ClientError::InvalidPayload {
                reason: format!("expected {data_type} payload, found {}", secret.data_type()),
            }
            .into());
        }
        Ok(secret)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret::{}(<redacted>)", self.data_type())
    }
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ClientError::MissingField { field }.into());
    }
    Ok(())
}
