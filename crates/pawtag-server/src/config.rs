//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use pawtag_export::ExportSettings;
use pawtag_shared::constants::{DEFAULT_HTTP_PORT, MAX_PHOTO_SIZE};
use pawtag_shared::payload::parse_origin;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Origin every QR code points at. Printed codes depend on it, so it
    /// should only ever change together with a redirect.
    /// Env: `PUBLIC_ORIGIN`
    /// Default: `http://localhost:8080`
    pub public_origin: String,

    /// SQLite file. `None` uses the platform data directory.
    /// Env: `DATABASE_PATH`
    pub database_path: Option<PathBuf>,

    /// Filesystem path where uploaded photos are stored.
    /// Env: `BLOB_STORAGE_PATH`
    /// Default: `./blobs`
    pub blob_storage_path: PathBuf,

    /// Maximum photo size in bytes.
    /// Env: `MAX_BLOB_SIZE`
    /// Default: 5 MiB
    pub max_blob_size: usize,

    /// Base URL of the Nominatim-compatible reverse geocoder.
    /// Env: `GEOCODER_URL`
    pub geocoder_url: String,

    /// Nominatim rejects requests without an identifying agent.
    /// Env: `GEOCODER_USER_AGENT`
    pub geocoder_user_agent: String,

    /// Whether finder reports are written to the store or only echoed back.
    /// Env: `PERSIST_LOCATIONS` (true/false)
    /// Default: `true`
    pub persist_locations: bool,

    /// Location reports accepted per client IP and minute.
    /// Env: `REPORTS_PER_MINUTE`
    /// Default: `20`
    pub reports_per_minute: u32,

    /// Admin account ensured at startup.
    /// Env: `BOOTSTRAP_ADMIN_EMAIL` + `BOOTSTRAP_ADMIN_TOKEN`
    pub bootstrap_admin: Option<BootstrapAdmin>,

    /// Canvas size and DXF sampling.
    /// Env: `EXPORT_CANVAS_PX`, `DXF_SAMPLE_STRIDE`, `DXF_DARK_THRESHOLD`,
    /// `DXF_UNITS_PER_PX`
    pub export: ExportSettings,
}

/// Credentials of the first administrator.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub token: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            public_origin: "http://localhost:8080".to_string(),
            database_path: None,
            blob_storage_path: PathBuf::from("./blobs"),
            max_blob_size: MAX_PHOTO_SIZE,
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            geocoder_user_agent: format!("pawtag/{}", env!("CARGO_PKG_VERSION")),
            persist_locations: true,
            reports_per_minute: 20,
            bootstrap_admin: None,
            export: ExportSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            parse_into(&mut config.http_addr, "HTTP_ADDR", &addr);
        }

        if let Some(origin) = lookup("PUBLIC_ORIGIN") {
            match parse_origin(&origin) {
                Ok(url) => {
                    config.public_origin = url.as_str().trim_end_matches('/').to_string();
                }
                Err(e) => {
                    tracing::warn!(value = %origin, error = %e, "Invalid PUBLIC_ORIGIN, using default");
                }
            }
        }

        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.trim().is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("BLOB_STORAGE_PATH") {
            config.blob_storage_path = PathBuf::from(path);
        }

        if let Some(val) = lookup("MAX_BLOB_SIZE") {
            parse_into(&mut config.max_blob_size, "MAX_BLOB_SIZE", &val);
        }

        if let Some(url) = lookup("GEOCODER_URL") {
            config.geocoder_url = url.trim_end_matches('/').to_string();
        }

        if let Some(agent) = lookup("GEOCODER_USER_AGENT").filter(|a| !a.trim().is_empty()) {
            config.geocoder_user_agent = agent;
        }

        if let Some(val) = lookup("PERSIST_LOCATIONS") {
            config.persist_locations = val != "false" && val != "0";
        }

        if let Some(val) = lookup("REPORTS_PER_MINUTE") {
            parse_checked(&mut config.reports_per_minute, "REPORTS_PER_MINUTE", &val, |n| *n > 0);
        }

        match (lookup("BOOTSTRAP_ADMIN_EMAIL"), lookup("BOOTSTRAP_ADMIN_TOKEN")) {
            (Some(email), Some(token)) if !email.is_empty() && !token.is_empty() => {
                config.bootstrap_admin = Some(BootstrapAdmin { email, token });
            }
            (None, None) => {}
            _ => tracing::warn!(
                "BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_TOKEN must both be set, ignoring"
            ),
        }

        // -- Export pipeline --

        if let Some(val) = lookup("EXPORT_CANVAS_PX") {
            parse_checked(&mut config.export.canvas_px, "EXPORT_CANVAS_PX", &val, |n| *n > 0);
        }

        if let Some(val) = lookup("DXF_SAMPLE_STRIDE") {
            parse_checked(&mut config.export.cut.stride_px, "DXF_SAMPLE_STRIDE", &val, |n| *n > 0);
        }

        if let Some(val) = lookup("DXF_DARK_THRESHOLD") {
            parse_into(&mut config.export.cut.dark_threshold, "DXF_DARK_THRESHOLD", &val);
        }

        if let Some(val) = lookup("DXF_UNITS_PER_PX") {
            parse_checked(&mut config.export.cut.units_per_px, "DXF_UNITS_PER_PX", &val, |u| {
                u.is_finite() && *u > 0.0
            });
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

/// Overwrite `slot` with the parsed value, or warn and keep the default.
fn parse_into<T: FromStr>(slot: &mut T, key: &str, raw: &str) {
    match raw.trim().parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => tracing::warn!(key, value = %raw, "Invalid value, using default"),
    }
}

/// [`parse_into`] for values that also have to pass `valid`.
fn parse_checked<T: FromStr>(slot: &mut T, key: &str, raw: &str, valid: impl Fn(&T) -> bool) {
    match raw.trim().parse::<T>() {
        Ok(parsed) if valid(&parsed) => *slot = parsed,
        _ => tracing::warn!(key, value = %raw, "Invalid value, using default"),
    }
}
