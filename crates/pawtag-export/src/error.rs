//! Export errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("SVG error: {0}")]
    Svg(#[from] resvg::usvg::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("DXF error: {0}")]
    Dxf(String),

    #[error("QR graphic not found")]
    GraphicMissing,

    #[error("Failed to allocate a {0}x{0} canvas")]
    Canvas(u32),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid export settings: {0}")]
    InvalidSettings(String),
}
