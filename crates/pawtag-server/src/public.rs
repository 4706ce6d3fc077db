//! Public info resolver and finder location reporter.
//!
//! Everything here is reachable without signing in: it is what a scanned
//! QR code leads to.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use pawtag_shared::payload::parse_payload;
use pawtag_shared::{LocationHistory, LocationSample, PayloadError, PetInfoView, PetRecord, QrId};
use pawtag_store::StoreError;

use crate::api::AppState;
use crate::error::ServerError;
use crate::page::{render_invalid_page, render_pet_page};

#[derive(Debug, Deserialize)]
pub struct QrQuery {
    qr_id: Option<String>,
    /// Full text an in-app scanner read off a tag. Wins over `qr_id`.
    code: Option<String>,
}

impl QrQuery {
    fn identifier(&self) -> Option<QrId> {
        let Some(code) = self.code.as_deref() else {
            return parse_qr_id(self.qr_id.as_deref());
        };
        match parse_payload(code) {
            Ok(qr_id) => Some(qr_id),
            Err(PayloadError::LegacyJson) => {
                info!("Scanned a retired JSON code");
                None
            }
            Err(e) => {
                debug!(error = %e, "Unreadable scanned code");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationReport {
    qr_id: String,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

fn parse_qr_id(raw: Option<&str>) -> Option<QrId> {
    let qr_id = raw.and_then(|raw| QrId::parse(raw.trim()).ok());
    if qr_id.is_none() {
        debug!(qr_id = ?raw, "Malformed QR identifier");
    }
    qr_id
}

/// Look a pet up. `None` covers every flavour of invalid code.
async fn resolve(
    state: &AppState,
    qr_id: Option<QrId>,
) -> Result<Option<(PetRecord, LocationHistory)>, ServerError> {
    let Some(qr_id) = qr_id else {
        return Ok(None);
    };

    let db = state.db.lock().await;
    let pet = match db.get_pet_by_qr_id(&qr_id) {
        Ok(pet) => pet,
        Err(StoreError::NotFound) => {
            debug!(qr_id = %qr_id, "Unknown QR identifier");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let history = if state.config.persist_locations {
        db.list_locations(pet.id)?
    } else {
        LocationHistory::new()
    };
    Ok(Some((pet, history)))
}

/// `GET /pet-info?qr_id=`, the URL every printed code carries.
pub async fn pet_info_page(
    State(state): State<AppState>,
    Query(query): Query<QrQuery>,
) -> Result<Response, ServerError> {
    let page = resolve(&state, parse_qr_id(query.qr_id.as_deref()))
        .await?
        .and_then(|(pet, history)| render_pet_page(&PetInfoView::found(pet, None, history)));

    Ok(match page {
        Some(html) => Html(html).into_response(),
        None => (StatusCode::NOT_FOUND, Html(render_invalid_page())).into_response(),
    })
}

/// `GET /api/pet-info?qr_id=` or `?code=<scanned text>`
pub async fn pet_info_json(
    State(state): State<AppState>,
    Query(query): Query<QrQuery>,
) -> Result<Json<PetInfoView>, ServerError> {
    let (pet, history) = resolve(&state, query.identifier())
        .await?
        .ok_or(ServerError::InvalidCode)?;
    Ok(Json(PetInfoView::found(pet, None, history)))
}

/// `POST /api/pet-info/location`
///
/// Missing coordinates mean the finder denied (or could not provide) a
/// position: nothing is recorded, but the contact details still come back.
pub async fn report_location(
    State(state): State<AppState>,
    Json(report): Json<LocationReport>,
) -> Result<Json<PetInfoView>, ServerError> {
    let (pet, mut history) = resolve(&state, parse_qr_id(Some(&report.qr_id)))
        .await?
        .ok_or(ServerError::InvalidCode)?;

    let Some((latitude, longitude)) = report.latitude.zip(report.longitude) else {
        debug!(qr_id = %pet.qr_id, "Finder shared no position");
        return Ok(Json(PetInfoView::found(pet, None, history)));
    };
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(ServerError::BadRequest("Invalid coordinates".into()));
    }

    // The database lock is not held while the geocoder is awaited.
    let mut sample = LocationSample::at(latitude, longitude);
    match state.geocoder.reverse(latitude, longitude).await {
        Ok(place) => sample = sample.with_place(place.city, place.country),
        Err(e) => warn!(qr_id = %pet.qr_id, error = %e, "Reverse geocoding failed"),
    }

    if state.config.persist_locations {
        match state.db.lock().await.insert_location(pet.id, &sample) {
            Ok(()) => {}
            // Deleted between lookup and insert.
            Err(StoreError::NotFound) => return Err(ServerError::InvalidCode),
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        qr_id = %pet.qr_id,
        city = sample.city.as_deref().unwrap_or("-"),
        "Finder location recorded"
    );

    history.push(sample.clone());
    Ok(Json(PetInfoView::found(pet, Some(sample), history)))
}
