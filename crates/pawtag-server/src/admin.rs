//! Admin console: every pet and every user, for administrators only.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use pawtag_shared::{PetDraft, PetRecord, UserId, UserProfile};

use crate::api::AppState;
use crate::auth::require_admin;
use crate::error::ServerError;
use crate::pets::{create_record, discard_photo, path_qr_id, CreatedPet};

#[derive(Debug, Deserialize)]
pub struct PetFilter {
    #[serde(default)]
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteConfirmation {
    #[serde(default)]
    confirm: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    email: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedUser {
    profile: UserProfile,
    /// Hand this to the new user; it is not shown again.
    access_token: String,
}

/// `GET /admin/pets?q=`
pub async fn list_pets(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(filter): Query<PetFilter>,
) -> Result<Json<Vec<PetRecord>>, ServerError> {
    require_admin(&state.auth, &headers).await?;

    let pets = state.db.lock().await.list_pets()?;
    let filter = filter.q.unwrap_or_default();
    Ok(Json(
        pets.into_iter()
            .filter(|pet| pet.matches_filter(&filter))
            .collect(),
    ))
}

/// `POST /admin/pets`
pub async fn create_pet(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(draft): Json<PetDraft>,
) -> Result<(StatusCode, Json<CreatedPet>), ServerError> {
    require_admin(&state.auth, &headers).await?;
    let created = create_record(&state, draft).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /admin/pets/:qr_id`: full update of the form fields. The display
/// identifier and the photo stay.
pub async fn update_pet(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(qr_id): Path<String>,
    Json(draft): Json<PetDraft>,
) -> Result<Json<PetRecord>, ServerError> {
    let admin = require_admin(&state.auth, &headers).await?;
    let qr_id = path_qr_id(&qr_id)?;

    let pet = {
        let db = state.db.lock().await;
        let mut pet = db.get_pet_by_qr_id(&qr_id)?;
        pet.apply(draft)?;
        db.update_pet(&pet)?;
        pet
    };

    info!(qr_id = %qr_id, admin = %admin.email, "Pet updated");
    Ok(Json(pet))
}

/// `DELETE /admin/pets/:qr_id?confirm=<qr_id>`
pub async fn delete_pet(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(qr_id): Path<String>,
    Query(confirmation): Query<DeleteConfirmation>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let admin = require_admin(&state.auth, &headers).await?;
    if confirmation.confirm.as_deref() != Some(qr_id.as_str()) {
        return Err(ServerError::BadRequest(
            "Deletion requires confirmation".into(),
        ));
    }
    let qr_id = path_qr_id(&qr_id)?;

    let photo_url = {
        let db = state.db.lock().await;
        let pet = db.get_pet_by_qr_id(&qr_id)?;
        db.delete_pet_by_qr_id(&qr_id)?;
        pet.photo_url
    };
    discard_photo(&state, photo_url.as_deref()).await;

    info!(qr_id = %qr_id, admin = %admin.email, "Pet deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// `GET /admin/users`
pub async fn list_users(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, ServerError> {
    require_admin(&state.auth, &headers).await?;
    Ok(Json(state.db.lock().await.list_profiles()?))
}

/// `POST /admin/users`
pub async fn create_user(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<CreatedUser>), ServerError> {
    let admin = require_admin(&state.auth, &headers).await?;
    let (profile, access_token) = state.auth.create_user(&new_user.email).await?;

    info!(user = %profile.email, admin = %admin.email, "User created from admin console");
    Ok((
        StatusCode::CREATED,
        Json(CreatedUser {
            profile,
            access_token,
        }),
    ))
}

/// `POST /admin/users/:id/toggle-admin`. Responds with the stored value.
pub async fn toggle_admin(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ServerError> {
    let admin = require_admin(&state.auth, &headers).await?;
    let profile = state.db.lock().await.toggle_admin(UserId(id))?;

    info!(
        user = %profile.email,
        is_admin = profile.is_admin,
        admin = %admin.email,
        "Admin flag toggled"
    );
    Ok(Json(profile))
}
