//! # pawtag-export
//!
//! Renders a pet's QR code and turns it into downloadable files:
//! - `.png` bitmap at a fixed canvas size
//! - `.svg` original vector markup
//! - `.pdf` single page with the bitmap placed at a fixed margin
//! - `.dxf` filled squares for laser cutting, sampled from the bitmap

pub mod cut;
pub mod error;
pub mod graphic;
pub mod pdf;
pub mod pipeline;
pub mod raster;

use pawtag_shared::payload::pet_info_url;
use pawtag_shared::QrId;
use url::Url;

pub use error::ExportError;
pub use graphic::QrGraphic;
pub use pipeline::{export_filename, ExportFormat, ExportPipeline, ExportSettings, ExportedFile};

/// Render the QR graphic pointing at the public page of `qr_id`.
pub fn render_pet_code(origin: &Url, qr_id: &QrId) -> Result<QrGraphic, ExportError> {
    QrGraphic::for_url(&pet_info_url(origin, qr_id))
}
