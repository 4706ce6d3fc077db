use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_QR_ID_LEN;
use crate::error::ValidationError;

// Internal row identifier. Never leaves the server inside a QR code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PetId(pub Uuid);

impl PetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Mirrors the identity issued by the auth layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display identifier embedded in a pet's public URL.
///
/// Opaque to finders and stable for the lifetime of the record: it is the
/// only value a printed QR code carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct QrId(String);

impl QrId {
    /// Generate a fresh identifier (32 lowercase hex chars).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let valid = !s.is_empty()
            && s.len() <= MAX_QR_ID_LEN
            && s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !valid {
            return Err(ValidationError::InvalidQrId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for QrId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QrId> for String {
    fn from(id: QrId) -> Self {
        id.0
    }
}

impl std::fmt::Display for QrId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
