/// Application name
pub const APP_NAME: &str = "Pawtag";

/// Path of the public info page. Printed QR codes point here, so it must
/// never change.
pub const PET_INFO_PATH: &str = "/pet-info";

/// Query parameter carrying the display identifier.
pub const QR_ID_PARAM: &str = "qr_id";

/// Maximum accepted length of a display identifier
pub const MAX_QR_ID_LEN: usize = 64;

/// Outbound messaging base URL
pub const WHATSAPP_BASE_URL: &str = "https://wa.me";

/// Map link base URL
pub const MAPS_BASE_URL: &str = "https://www.google.com/maps";

/// Currency prefix shown in front of rewards
pub const REWARD_CURRENCY: &str = "R$";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Maximum photo upload size in bytes (5 MiB)
pub const MAX_PHOTO_SIZE: usize = 5 * 1024 * 1024;
