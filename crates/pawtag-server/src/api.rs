use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use url::Url;

use pawtag_export::ExportPipeline;
use pawtag_shared::constants::PET_INFO_PATH;
use pawtag_shared::payload::parse_origin;
use pawtag_shared::UserProfile;
use pawtag_store::Database;

use crate::admin;
use crate::auth::{bearer_token, require_user, Auth};
use crate::blob_store::BlobStore;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::geocode::ReverseGeocoder;
use crate::page::REPORT_PATH;
use crate::pets;
use crate::public;
use crate::rate_limit::{limit_reports, RateLimiter};

/// Room for multipart framing on top of the photo itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub blob_store: Arc<BlobStore>,
    pub auth: Auth,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub pipeline: Arc<ExportPipeline>,
    /// Parsed `PUBLIC_ORIGIN`.
    pub origin: Arc<Url>,
    pub report_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire every subsystem together. The returned handle is the session
    /// listener task.
    pub async fn build(
        config: ServerConfig,
        db: Database,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> anyhow::Result<(Self, JoinHandle<()>)> {
        let origin = parse_origin(&config.public_origin)?;
        let pipeline = ExportPipeline::new(config.export)?;
        let blob_store =
            BlobStore::new(config.blob_storage_path.clone(), config.max_blob_size).await?;

        let db = Arc::new(Mutex::new(db));
        let (auth, listener) = Auth::start(db.clone());

        let state = Self {
            db,
            blob_store: Arc::new(blob_store),
            auth,
            geocoder,
            pipeline: Arc::new(pipeline),
            origin: Arc::new(origin),
            report_limiter: RateLimiter::per_minute(config.reports_per_minute),
            config: Arc::new(config),
        };
        Ok((state, listener))
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let reports = Router::new()
        .route(REPORT_PATH, post(public::report_location))
        .route_layer(middleware::from_fn_with_state(
            state.report_limiter.clone(),
            limit_reports,
        ));

    Router::new()
        .route("/health", get(health_check))
        // Public
        .route(PET_INFO_PATH, get(public::pet_info_page))
        .route("/api/pet-info", get(public::pet_info_json))
        .merge(reports)
        .route("/blob/:id", get(pets::get_blob))
        // Signed in
        .route("/auth/me", get(current_user))
        .route("/auth/session", delete(sign_out))
        .route("/api/pets", post(pets::create_pet))
        .route("/api/pets/:qr_id/qr", get(pets::download_qr))
        .route("/api/pets/:qr_id/photo", post(pets::upload_photo))
        // Admin
        .route("/admin/pets", get(admin::list_pets).post(admin::create_pet))
        .route(
            "/admin/pets/:qr_id",
            put(admin::update_pet).delete(admin::delete_pet),
        )
        .route("/admin/users", get(admin::list_users).post(admin::create_user))
        .route("/admin/users/:id/toggle-admin", post(admin::toggle_admin))
        .layer(DefaultBodyLimit::max(
            state.blob_store.max_size() + MULTIPART_OVERHEAD,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /auth/me`
async fn current_user(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ServerError> {
    Ok(Json(require_user(&state.auth, &headers).await?))
}

/// `DELETE /auth/session`
async fn sign_out(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let user = require_user(&state.auth, &headers).await?;
    let token = bearer_token(&headers).ok_or(ServerError::Unauthorized)?;
    state.auth.sign_out(token).await?;

    info!(user = %user.id, "Signed out");
    Ok(Json(serde_json::json!({ "signed_out": true })))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::testing::{empty_request, send, TestApp};

    #[tokio::test]
    async fn health_reports_version() {
        let app = TestApp::new().await;
        let (status, body) = send(&app.router, empty_request(Method::GET, "/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn me_then_sign_out() {
        let app = TestApp::new().await;
        let token = app.user_token().await;

        let (status, me) = send(&app.router, empty_request(Method::GET, "/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["is_admin"], false);

        let (status, body) = send(
            &app.router,
            empty_request(Method::DELETE, "/auth/session", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["signed_out"], true);

        let (status, _) = send(&app.router, empty_request(Method::GET, "/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_blob_is_not_found() {
        let app = TestApp::new().await;
        let (status, _) = send(
            &app.router,
            empty_request(Method::GET, &format!("/blob/{}", uuid::Uuid::new_v4()), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
