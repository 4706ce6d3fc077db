use thiserror::Error;

/// Rejections produced while checking user input or rows read back from
/// the store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Reward must be a finite, non-negative amount (got {0})")]
    InvalidReward(f64),

    #[error("Invalid QR identifier: {0}")]
    InvalidQrId(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Phone number has no digits")]
    PhoneWithoutDigits,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    #[error("Payload is not a URL: {0}")]
    NotAUrl(String),

    #[error("Payload does not point at the pet info page")]
    WrongPath,

    #[error("Payload has no qr_id parameter")]
    MissingQrId,

    #[error("Payload carries an invalid qr_id: {0}")]
    InvalidQrId(String),

    #[error("Payload uses the retired inline JSON format")]
    LegacyJson,

    #[error("Invalid public origin: {0}")]
    InvalidOrigin(String),
}
