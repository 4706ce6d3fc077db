//! Owner flow: create a pet profile, download its QR code, attach a photo.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use pawtag_export::{render_pet_code, ExportFormat};
use pawtag_shared::payload::pet_info_url;
use pawtag_shared::{PetDraft, PetRecord, QrId};

use crate::api::AppState;
use crate::auth::require_user;
use crate::blob_store::blob_id_from_url;
use crate::error::ServerError;

#[derive(Debug, Serialize)]
pub struct CreatedPet {
    pub pet: PetRecord,
    /// Exact string encoded into the QR code.
    pub qr_value: String,
}

#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    format: Option<String>,
}

/// Validate a draft, persist it and report the QR value. Shared with the
/// admin console.
pub async fn create_record(state: &AppState, draft: PetDraft) -> Result<CreatedPet, ServerError> {
    let pet = draft.into_record()?;
    state.db.lock().await.insert_pet(&pet)?;

    let qr_value = pet_info_url(&state.origin, &pet.qr_id).to_string();
    info!(qr_id = %pet.qr_id, pet = %pet.pet_name, "Pet created");
    Ok(CreatedPet { pet, qr_value })
}

/// Parse a path identifier; anything malformed is simply not found.
pub fn path_qr_id(raw: &str) -> Result<QrId, ServerError> {
    QrId::parse(raw).map_err(|_| ServerError::NotFound("Pet not found".into()))
}

/// Remove a photo previously uploaded to this instance.
pub async fn discard_photo(state: &AppState, photo_url: Option<&str>) {
    let Some(id) = photo_url.and_then(|url| blob_id_from_url(&state.origin, url)) else {
        return;
    };
    if let Err(e) = state.blob_store.delete(id).await {
        warn!(blob = %id, error = %e, "Failed to remove old photo");
    }
}

/// `POST /api/pets`
pub async fn create_pet(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(draft): Json<PetDraft>,
) -> Result<(StatusCode, Json<CreatedPet>), ServerError> {
    require_user(&state.auth, &headers).await?;
    let created = create_record(&state, draft).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/pets/:qr_id/qr?format=png|svg|pdf|dxf`
pub async fn download_qr(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(qr_id): Path<String>,
    Query(query): Query<FormatQuery>,
) -> Result<Response, ServerError> {
    require_user(&state.auth, &headers).await?;

    let format: ExportFormat = query.format.as_deref().unwrap_or("png").parse()?;
    let qr_id = path_qr_id(&qr_id)?;
    let pet = state.db.lock().await.get_pet_by_qr_id(&qr_id)?;

    let origin = state.origin.clone();
    let pipeline = state.pipeline.clone();
    let file = tokio::task::spawn_blocking(move || {
        let graphic = render_pet_code(&origin, &pet.qr_id)?;
        pipeline.export(&graphic, &pet.pet_name, format)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Export task failed: {e}")))??;

    info!(
        qr_id = %qr_id,
        format = format.extension(),
        size = file.bytes.len(),
        "QR code downloaded"
    );

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.bytes,
    )
        .into_response())
}

/// `POST /api/pets/:qr_id/photo` (multipart field `file`)
pub async fn upload_photo(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(qr_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<PetRecord>, ServerError> {
    require_user(&state.auth, &headers).await?;
    let qr_id = path_qr_id(&qr_id)?;
    // Fail before reading the body if the pet does not exist.
    state.db.lock().await.get_pet_by_qr_id(&qr_id)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))?;

        let blob_id = state.blob_store.store_image(&data).await?;
        let photo_url = state
            .origin
            .join(&format!("/blob/{blob_id}"))
            .map_err(|e| ServerError::Internal(e.to_string()))?
            .to_string();

        let (pet, previous) = {
            let db = state.db.lock().await;
            let mut pet = db.get_pet_by_qr_id(&qr_id)?;
            let previous = pet.photo_url.replace(photo_url);
            db.update_pet(&pet)?;
            (pet, previous)
        };
        discard_photo(&state, previous.as_deref()).await;

        info!(qr_id = %qr_id, blob = %blob_id, size = data.len(), "Photo uploaded");
        return Ok(Json(pet));
    }

    Err(ServerError::BadRequest(
        "Missing 'file' field in multipart form".to_string(),
    ))
}

/// `GET /blob/:id`
pub async fn get_blob(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServerError> {
    let blob = state.blob_store.get(id).await?;
    Ok(([(header::CONTENT_TYPE, blob.content_type)], blob.bytes).into_response())
}
