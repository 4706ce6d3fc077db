//! QR payload protocol.
//!
//! A QR code carries nothing but the public URL of the pet info page:
//! `<origin>/pet-info?qr_id=<display identifier>`. The record itself is
//! fetched when the code is scanned, so edits never require reprinting and
//! no personal data is baked into the image.
//!
//! Early codes embedded the whole record as URL-encoded JSON. Those are
//! recognised only so they can be rejected with a specific error.

use url::Url;

use crate::constants::{PET_INFO_PATH, QR_ID_PARAM};
use crate::error::PayloadError;
use crate::types::QrId;

/// Validate a public origin such as `https://pawtag.example`.
pub fn parse_origin(origin: &str) -> Result<Url, PayloadError> {
    let url = Url::parse(origin.trim())
        .map_err(|_| PayloadError::InvalidOrigin(origin.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(PayloadError::InvalidOrigin(origin.to_string()));
    }
    Ok(url)
}

/// Build the QR value for a record. Any path, query or fragment on the
/// origin is discarded.
pub fn pet_info_url(origin: &Url, qr_id: &QrId) -> Url {
    let mut url = origin.clone();
    url.set_path(PET_INFO_PATH);
    url.set_fragment(None);
    url.set_query(None);
    url.query_pairs_mut().append_pair(QR_ID_PARAM, qr_id.as_str());
    url
}

/// Decode a scanned QR value back into the display identifier.
pub fn parse_payload(payload: &str) -> Result<QrId, PayloadError> {
    let payload = payload.trim();
    if is_legacy_json(payload) {
        return Err(PayloadError::LegacyJson);
    }

    let url = Url::parse(payload).map_err(|_| PayloadError::NotAUrl(payload.to_string()))?;
    if url.path().trim_end_matches('/') != PET_INFO_PATH {
        return Err(PayloadError::WrongPath);
    }

    let raw = url
        .query_pairs()
        .find(|(key, _)| key == QR_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .ok_or(PayloadError::MissingQrId)?;

    QrId::parse(&raw).map_err(|_| PayloadError::InvalidQrId(raw))
}

fn is_legacy_json(payload: &str) -> bool {
    payload.starts_with('{') || payload.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("%7B"))
}
