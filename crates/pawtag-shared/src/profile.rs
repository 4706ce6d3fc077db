use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::UserId;

/// Account metadata kept next to an auth identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Same id as the auth identity.
    pub id: UserId,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(email: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: UserId::new(),
            email: normalize_email(email)?,
            is_admin: false,
            created_at: Utc::now(),
        })
    }
}

/// Lowercase and sanity-check an email address. Delivery is someone
/// else's problem; this only rejects obvious garbage.
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::InvalidEmail(email));
    }
    Ok(email)
}
