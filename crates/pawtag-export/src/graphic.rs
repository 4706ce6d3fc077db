//! Vector QR graphic.
//!
//! The graphic is plain SVG markup: a white square with one unit-sized
//! path segment per dark module, drawn in module coordinates and scaled to
//! a fixed logical size through `viewBox`.

use std::fmt::Write as _;

use qrcode::{Color, EcLevel, QrCode};
use url::Url;

use crate::error::ExportError;

/// Logical edge length of the rendered graphic.
pub const LOGICAL_SIZE: u32 = 256;

/// Light modules kept around the code so scanners can find it.
pub const QUIET_ZONE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrGraphic {
    markup: String,
}

impl QrGraphic {
    /// Encode `url` at error-correction level H and render it.
    pub fn for_url(url: &Url) -> Result<Self, ExportError> {
        let code = QrCode::with_error_correction_level(url.as_str(), EcLevel::H)?;
        let width = code.width();
        let dark: Vec<bool> = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        Ok(Self {
            markup: render_svg(width, &dark),
        })
    }

    /// Wrap markup that was rendered elsewhere. Anything that is not an SVG
    /// document counts as a missing graphic.
    pub fn from_markup(markup: impl Into<String>) -> Result<Self, ExportError> {
        let markup = markup.into();
        if !markup.contains("<svg") {
            return Err(ExportError::GraphicMissing);
        }
        Ok(Self { markup })
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

/// `dark` is row-major, `width * width` long.
fn render_svg(width: usize, dark: &[bool]) -> String {
    let total = width + 2 * QUIET_ZONE;
    let mut svg = String::with_capacity(256 + dark.len() * 4);

    let _ = write!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {total} {total}" shape-rendering="crispEdges"><rect width="{total}" height="{total}" fill="#ffffff"/><path fill="#000000" d=""##,
        size = LOGICAL_SIZE,
        total = total,
    );
    for (i, _) in dark.iter().enumerate().filter(|(_, d)| **d) {
        let x = i % width + QUIET_ZONE;
        let y = i / width + QUIET_ZONE;
        let _ = write!(svg, "M{x},{y}h1v1h-1z");
    }
    svg.push_str(r#""/></svg>"#);
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_deterministic_svg() {
        let url = Url::parse("https://pawtag.example/pet-info?qr_id=abc").unwrap();
        let a = QrGraphic::for_url(&url).unwrap();
        let b = QrGraphic::for_url(&url).unwrap();
        assert_eq!(a, b);
        assert!(a.markup().starts_with("<svg"));
        assert!(a.markup().contains(r#"width="256""#));
        assert!(a.markup().ends_with("</svg>"));
    }

    #[test]
    fn test_render_svg_places_modules_inside_quiet_zone() {
        let svg = render_svg(2, &[true, false, false, true]);
        assert!(svg.contains(r#"viewBox="0 0 10 10""#));
        assert!(svg.contains("M4,4h1v1h-1z"));
        assert!(svg.contains("M5,5h1v1h-1z"));
        assert!(!svg.contains("M5,4"));
    }

    #[test]
    fn test_from_markup_rejects_non_svg() {
        assert!(matches!(
            QrGraphic::from_markup(""),
            Err(ExportError::GraphicMissing)
        ));
        assert!(QrGraphic::from_markup("<svg></svg>").is_ok());
    }
}
