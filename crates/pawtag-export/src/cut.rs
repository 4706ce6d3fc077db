//! Laser-cut DXF output.
//!
//! The raster is sampled on a fixed grid; every dark sample becomes one
//! filled square (`SOLID`) in drawing units. Sampling trades fidelity for a
//! primitive count cutters can handle.

use image::GrayImage;

use crate::error::ExportError;

/// Axis-aligned rectangle in drawing units, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutSettings {
    /// Distance between samples, in pixels, on both axes.
    pub stride_px: u32,
    /// Samples with luma strictly below this are dark.
    pub dark_threshold: u8,
    /// Drawing units (millimetres) per pixel.
    pub units_per_px: f64,
}

impl Default for CutSettings {
    fn default() -> Self {
        Self {
            stride_px: 10,
            dark_threshold: 128,
            units_per_px: 0.1,
        }
    }
}

impl CutSettings {
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.stride_px == 0 {
            return Err(ExportError::InvalidSettings("stride must be positive".into()));
        }
        if !self.units_per_px.is_finite() || self.units_per_px <= 0.0 {
            return Err(ExportError::InvalidSettings(format!(
                "units per pixel must be positive (got {})",
                self.units_per_px
            )));
        }
        Ok(())
    }
}

/// Walk `image` on the sampling grid and collect a rectangle for every dark
/// sample. Image rows grow downwards, drawing y grows upwards.
pub fn sample_cut_rects(image: &GrayImage, settings: &CutSettings) -> Vec<CutRect> {
    let stride = settings.stride_px.max(1);
    let scale = settings.units_per_px;
    let side = f64::from(stride) * scale;
    let height = f64::from(image.height());

    let mut rects = Vec::new();
    for y in (0..image.height()).step_by(stride as usize) {
        for x in (0..image.width()).step_by(stride as usize) {
            if image.get_pixel(x, y).0[0] < settings.dark_threshold {
                rects.push(CutRect {
                    x: f64::from(x) * scale,
                    y: (height - f64::from(y) - f64::from(stride)) * scale,
                    width: side,
                    height: side,
                });
            }
        }
    }
    rects
}

/// Serialize rectangles as an ASCII DXF drawing.
pub fn write_dxf(rects: &[CutRect]) -> Result<Vec<u8>, ExportError> {
    let mut drawing = dxf::Drawing::new();

    for rect in rects {
        let (x0, y0) = (rect.x, rect.y);
        let (x1, y1) = (rect.x + rect.width, rect.y + rect.height);

        // SOLID corners go in zig-zag order: 1-2 bottom edge, 3-4 top edge.
        let mut solid = dxf::entities::Solid::default();
        solid.first_corner = dxf::Point::new(x0, y0, 0.0);
        solid.second_corner = dxf::Point::new(x1, y0, 0.0);
        solid.third_corner = dxf::Point::new(x0, y1, 0.0);
        solid.fourth_corner = dxf::Point::new(x1, y1, 0.0);

        drawing.add_entity(dxf::entities::Entity::new(
            dxf::entities::EntityType::Solid(solid),
        ));
    }

    let mut out = Vec::new();
    drawing
        .save(&mut out)
        .map_err(|e| ExportError::Dxf(e.to_string()))?;
    Ok(out)
}
