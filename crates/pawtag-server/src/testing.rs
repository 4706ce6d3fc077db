//! In-process harness for router tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pawtag_shared::{PetDraft, PetRecord};
use pawtag_store::Database;

use crate::api::{build_router, AppState};
use crate::config::ServerConfig;
use crate::geocode::{GeocodeError, Place, ReverseGeocoder};

/// Smallest PNG signature `image::guess_format` recognises.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

pub const ADMIN_TOKEN: &str = "admin-test-token";

/// Geocoder answering with a fixed place, or failing when it has none.
pub struct StubGeocoder {
    place: Option<Place>,
}

#[async_trait]
impl ReverseGeocoder for StubGeocoder {
    async fn reverse(&self, _latitude: f64, _longitude: f64) -> Result<Place, GeocodeError> {
        self.place
            .clone()
            .ok_or_else(|| GeocodeError::Unavailable("stub has no place".into()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _blobs: TempDir,
}

impl TestApp {
    /// App whose geocoder always fails.
    pub async fn new() -> Self {
        Self::build(None).await
    }

    pub async fn with_place(place: Place) -> Self {
        Self::build(Some(place)).await
    }

    async fn build(place: Option<Place>) -> Self {
        let blobs = TempDir::new().unwrap();
        let mut config = ServerConfig {
            public_origin: "https://pawtag.test".into(),
            blob_storage_path: blobs.path().to_path_buf(),
            max_blob_size: 4096,
            ..ServerConfig::default()
        };
        config.export.canvas_px = 400;

        let (state, _listener) = AppState::build(
            config,
            Database::open_in_memory().unwrap(),
            Arc::new(StubGeocoder { place }),
        )
        .await
        .unwrap();

        Self {
            router: build_router(state.clone()),
            state,
            _blobs: blobs,
        }
    }

    pub async fn insert_pet(&self, name: &str) -> PetRecord {
        let pet = PetDraft {
            pet_name: name.into(),
            owner_name: "João".into(),
            phone: "(11) 99999-9999".into(),
            ..Default::default()
        }
        .into_record()
        .unwrap();
        self.state.db.lock().await.insert_pet(&pet).unwrap();
        pet
    }

    /// Token of a fresh, non-admin user.
    pub async fn user_token(&self) -> String {
        let email = format!("user-{}@pawtag.test", uuid::Uuid::new_v4().simple());
        self.state.auth.create_user(&email).await.unwrap().1
    }

    pub async fn admin_token(&self) -> String {
        self.state
            .auth
            .ensure_admin("admin@pawtag.test", ADMIN_TOKEN)
            .await
            .unwrap();
        ADMIN_TOKEN.to_string()
    }
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    builder(method, uri, token).body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    builder(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn multipart_request(uri: &str, token: &str, field: &str, bytes: &[u8]) -> Request<Body> {
    const BOUNDARY: &str = "pawtag-test-boundary";
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"photo.png\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    builder(Method::POST, uri, Some(token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn send_raw(router: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, bytes.to_vec())
}

pub async fn send_text(router: &Router, req: Request<Body>) -> (StatusCode, String) {
    let (status, _, bytes) = send_raw(router, req).await;
    (status, String::from_utf8(bytes).unwrap())
}

/// JSON body, `Null` when empty, a string when not JSON.
pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, text) = send_text(router, req).await;
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, body)
}
