use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use uuid::Uuid;

use pawtag_export::ExportError;
use pawtag_shared::{PetInfoView, ValidationError};
use pawtag_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not signed in")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing, malformed or unknown `qr_id` on a public route.
    #[error("Invalid QR code")]
    InvalidCode,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Blob not found: {0}")]
    BlobNotFound(Uuid),

    #[error("Blob too large: {size} bytes (max {max})")]
    BlobTooLarge { size: usize, max: usize },

    #[error("Blob storage error: {0}")]
    BlobStorage(String),

    #[error("Export failed: {0}")]
    Export(ExportError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServerError::NotFound("Record not found".into()),
            StoreError::Conflict(what) => ServerError::Conflict(what),
            StoreError::Invalid(v) => ServerError::BadRequest(v.to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationError> for ServerError {
    fn from(e: ValidationError) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

impl From<ExportError> for ServerError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::UnsupportedFormat(_) => ServerError::BadRequest(e.to_string()),
            other => ServerError::Export(other),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if matches!(self, ServerError::InvalidCode) {
            return (StatusCode::NOT_FOUND, axum::Json(PetInfoView::Invalid)).into_response();
        }

        let (status, message) = match &self {
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::InvalidCode | ServerError::NotFound(_) | ServerError::BlobNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ServerError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ServerError::BlobTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::BlobStorage(_) => {
                tracing::error!(error = %self, "Blob storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Blob storage error".to_string())
            }
            ServerError::Export(_) => {
                tracing::error!(error = %self, "Export failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Export failed".to_string())
            }
            ServerError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
