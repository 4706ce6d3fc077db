use image::RgbaImage;
use resvg::{tiny_skia, usvg};

use crate::error::ExportError;
use crate::graphic::QrGraphic;

/// Rasterize the graphic onto an opaque white `size_px` square canvas.
#[allow(clippy::cast_precision_loss)]
pub fn rasterize(graphic: &QrGraphic, size_px: u32) -> Result<RgbaImage, ExportError> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_data(graphic.markup().as_bytes(), &options)?;

    let Some(mut pixmap) = tiny_skia::Pixmap::new(size_px, size_px) else {
        return Err(ExportError::Canvas(size_px));
    };
    // Transparent pixels would read as black once alpha is dropped.
    pixmap.fill(tiny_skia::Color::WHITE);

    let transform = tiny_skia::Transform::from_scale(
        size_px as f32 / tree.size().width(),
        size_px as f32 / tree.size().height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixmap.data().to_vec())
        .ok_or(ExportError::Canvas(size_px))
}
