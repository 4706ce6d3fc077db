//! Single-page PDF output: one RGB bitmap placed on an A4 sheet.

use image::RgbImage;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Pt, Px,
};

use crate::error::ExportError;

const PT_PER_MM: f64 = 72.0 / 25.4;

/// At 72 dpi one pixel is one point, so scale factors are plain pt/px.
const IMAGE_DPI: f32 = 72.0;

/// Where the bitmap lands on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// Portrait page size in millimetres.
    pub width_mm: f64,
    pub height_mm: f64,
    /// Margin from the top-left corner, in millimetres.
    pub margin_mm: f64,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 10.0,
        }
    }
}

impl PageLayout {
    /// Square placement `(x, y, side)` in PDF points, origin bottom-left.
    pub fn placement_pt(&self) -> (f64, f64, f64) {
        let side = (self.width_mm - 2.0 * self.margin_mm).min(self.height_mm - 2.0 * self.margin_mm);
        let x = self.margin_mm;
        let y = self.height_mm - self.margin_mm - side;
        (x * PT_PER_MM, y * PT_PER_MM, side * PT_PER_MM)
    }
}

/// Write `image` onto a single page laid out per `layout`.
pub fn write_pdf(image: &RgbImage, layout: &PageLayout) -> Result<Vec<u8>, ExportError> {
    let (doc, page, layer) = PdfDocument::new(
        "QR code",
        Mm(layout.width_mm as f32),
        Mm(layout.height_mm as f32),
        "QR code",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let (x, y, side) = layout.placement_pt();
    let bitmap = Image::from(ImageXObject {
        width: Px(image.width() as usize),
        height: Px(image.height() as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: false,
        image_data: image.as_raw().clone(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    });
    bitmap.add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm::from(Pt(x as f32))),
            translate_y: Some(Mm::from(Pt(y as f32))),
            scale_x: Some((side / f64::from(image.width())) as f32),
            scale_y: Some((side / f64::from(image.height())) as f32),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );

    doc.save_to_bytes()
        .map_err(|e| ExportError::Pdf(e.to_string()))
}
