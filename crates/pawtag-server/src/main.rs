//! # pawtag-server
//!
//! Web backend for Pawtag pet identification tags.
//!
//! This binary provides:
//! - **Public pet page** at `/pet-info?qr_id=`, the URL every printed QR
//!   code encodes, plus its JSON twin and the finder location reporter
//! - **Owner flow**: register a pet, upload a photo, download the code as
//!   PNG, SVG, PDF or DXF
//! - **Admin console** over every pet and every user
//! - **Per-IP rate limiting** on the public location reporter

mod admin;
mod api;
mod auth;
mod blob_store;
mod config;
mod error;
mod geocode;
mod page;
mod pets;
mod public;
mod rate_limit;
#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use pawtag_store::Database;

use crate::api::AppState;
use crate::auth::AuthEvent;
use crate::config::ServerConfig;
use crate::geocode::NominatimGeocoder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pawtag_server=debug")),
        )
        .init();

    info!("Starting Pawtag server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let db = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };

    let geocoder = Arc::new(NominatimGeocoder::new(
        &config.geocoder_url,
        &config.geocoder_user_agent,
    )?);

    let bootstrap_admin = config.bootstrap_admin.clone();
    let http_addr = config.http_addr;

    let (app_state, session_listener) = AppState::build(config, db, geocoder).await?;

    if let Some(admin) = bootstrap_admin {
        app_state.auth.ensure_admin(&admin.email, &admin.token).await?;
    }
    info!(
        sessions = app_state.auth.sessions().len().await,
        "Session cache loaded"
    );

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Audit trail of sign-ins and sign-outs
    let mut events = app_state.auth.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AuthEvent::SignedIn { user_id, .. }) => {
                    debug!(user = %user_id, "audit: sign-in");
                }
                Ok(AuthEvent::SignedOut { .. }) => debug!("audit: sign-out"),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Audit log fell behind session events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Periodic rate limiter cleanup (every 5 minutes, forget clients idle >10 min)
    let limiter = app_state.report_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.forget_idle(Duration::from_secs(600)).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    session_listener.abort();
    Ok(())
}
