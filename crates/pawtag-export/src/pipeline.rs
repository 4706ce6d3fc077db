//! Format selection and file naming for QR downloads.

use std::io::Cursor;
use std::str::FromStr;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::cut::{sample_cut_rects, write_dxf, CutSettings};
use crate::error::ExportError;
use crate::graphic::QrGraphic;
use crate::pdf::{write_pdf, PageLayout};
use crate::raster::rasterize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Svg,
    Pdf,
    Dxf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Png, Self::Svg, Self::Pdf, Self::Dxf];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
            Self::Dxf => "dxf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
            Self::Pdf => "application/pdf",
            Self::Dxf => "application/dxf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ExportError::UnsupportedFormat(s.to_string()))
    }
}

/// Tunables of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSettings {
    /// Edge of the square bitmap every raster format starts from.
    pub canvas_px: u32,
    pub cut: CutSettings,
    pub page: PageLayout,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            canvas_px: 1200,
            cut: CutSettings::default(),
            page: PageLayout::default(),
        }
    }
}

impl ExportSettings {
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.canvas_px == 0 {
            return Err(ExportError::InvalidSettings("canvas size must be positive".into()));
        }
        self.cut.validate()
    }
}

/// A file ready to be handed to the user.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct ExportPipeline {
    settings: ExportSettings,
}

impl ExportPipeline {
    pub fn new(settings: ExportSettings) -> Result<Self, ExportError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn export(
        &self,
        graphic: &QrGraphic,
        pet_name: &str,
        format: ExportFormat,
    ) -> Result<ExportedFile, ExportError> {
        let bytes = match format {
            ExportFormat::Svg => graphic.markup().as_bytes().to_vec(),
            ExportFormat::Png => self.png(graphic)?,
            ExportFormat::Pdf => self.pdf(graphic)?,
            ExportFormat::Dxf => self.dxf(graphic)?,
        };

        debug!(
            format = format.extension(),
            size = bytes.len(),
            "QR graphic exported"
        );

        Ok(ExportedFile {
            filename: export_filename(pet_name, format),
            content_type: format.content_type(),
            bytes: Bytes::from(bytes),
        })
    }

    fn png(&self, graphic: &QrGraphic) -> Result<Vec<u8>, ExportError> {
        let raster = rasterize(graphic, self.settings.canvas_px)?;
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(raster).write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }

    fn pdf(&self, graphic: &QrGraphic) -> Result<Vec<u8>, ExportError> {
        let raster = rasterize(graphic, self.settings.canvas_px)?;
        let rgb = DynamicImage::ImageRgba8(raster).to_rgb8();
        write_pdf(&rgb, &self.settings.page)
    }

    fn dxf(&self, graphic: &QrGraphic) -> Result<Vec<u8>, ExportError> {
        let raster = rasterize(graphic, self.settings.canvas_px)?;
        let luma = DynamicImage::ImageRgba8(raster).to_luma8();
        let rects = sample_cut_rects(&luma, &self.settings.cut);
        debug!(rects = rects.len(), "Sampled cut rectangles");
        write_dxf(&rects)
    }
}

/// `<pet name>-qr-code.<ext>`, reduced to characters that are safe in a
/// download header and on every filesystem.
pub fn export_filename(pet_name: &str, format: ExportFormat) -> String {
    let mut stem = String::with_capacity(pet_name.len());
    for c in pet_name.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            stem.push(c);
        } else if c.is_whitespace() && !stem.ends_with('-') {
            stem.push('-');
        }
    }
    let stem = stem.trim_matches('-');
    let stem = if stem.is_empty() { "pet" } else { stem };
    format!("{}-qr-code.{}", stem, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn graphic() -> QrGraphic {
        let url = Url::parse("https://pawtag.example/pet-info?qr_id=0123456789abcdef").unwrap();
        QrGraphic::for_url(&url).unwrap()
    }

    fn small_pipeline() -> ExportPipeline {
        ExportPipeline::new(ExportSettings {
            canvas_px: 300,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PNG".parse::<ExportFormat>().unwrap(), ExportFormat::Png);
        assert_eq!("dxf".parse::<ExportFormat>().unwrap(), ExportFormat::Dxf);
        assert!("gif".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_filenames() {
        assert_eq!(export_filename("Rex", ExportFormat::Png), "Rex-qr-code.png");
        assert_eq!(
            export_filename("Mr. Whiskers ", ExportFormat::Pdf),
            "Mr-Whiskers-qr-code.pdf"
        );
        assert_eq!(export_filename("../../", ExportFormat::Svg), "pet-qr-code.svg");
    }

    #[test]
    fn test_svg_is_source_markup() {
        let graphic = graphic();
        let file = small_pipeline()
            .export(&graphic, "Rex", ExportFormat::Svg)
            .unwrap();
        assert_eq!(file.bytes.as_ref(), graphic.markup().as_bytes());
        assert_eq!(file.content_type, "image/svg+xml");
        assert_eq!(file.filename, "Rex-qr-code.svg");
    }

    #[test]
    fn test_png_has_canvas_size() {
        let file = small_pipeline()
            .export(&graphic(), "Rex", ExportFormat::Png)
            .unwrap();
        let decoded = image::load_from_memory(&file.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 300));
    }

    #[test]
    fn test_pdf_and_dxf_produce_documents() {
        let pipeline = small_pipeline();
        let graphic = graphic();

        let pdf = pipeline.export(&graphic, "Rex", ExportFormat::Pdf).unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF-"));

        let dxf = pipeline.export(&graphic, "Rex", ExportFormat::Dxf).unwrap();
        let drawing = dxf::Drawing::load(&mut dxf.bytes.as_ref()).unwrap();
        assert!(drawing.entities().count() > 0);
    }

    fn solid_corners(bytes: &[u8]) -> Vec<(f64, f64)> {
        let drawing = dxf::Drawing::load(&mut &bytes[..]).unwrap();
        drawing
            .entities()
            .filter_map(|e| match &e.specific {
                dxf::entities::EntityType::Solid(s) => Some((s.first_corner.x, s.first_corner.y)),
                _ => None,
            })
            .collect()
    }

    fn module_grid(path: &str) -> QrGraphic {
        QrGraphic::from_markup(format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="120" viewBox="0 0 120 120" shape-rendering="crispEdges"><rect width="120" height="120" fill="#ffffff"/><path fill="#000000" d="{path}"/></svg>"##
        ))
        .unwrap()
    }

    #[test]
    fn test_dxf_from_svg_places_module_solid() {
        // 1200 px canvas over 120 modules: one module per 10 px sample
        let pipeline = ExportPipeline::default();

        let file = pipeline
            .export(&module_grid("M3,2h1v1h-1z"), "Rex", ExportFormat::Dxf)
            .unwrap();
        assert_eq!(file.filename, "Rex-qr-code.dxf");

        let solids = solid_corners(&file.bytes);
        assert_eq!(solids.len(), 1);
        let (x, y) = solids[0];
        assert!((x - 3.0).abs() < 1e-6, "x = {x}");
        assert!((y - 117.0).abs() < 1e-6, "y = {y}");

        let blank = pipeline
            .export(&module_grid(""), "Rex", ExportFormat::Dxf)
            .unwrap();
        assert!(solid_corners(&blank.bytes).is_empty());
    }

    #[test]
    fn test_zero_canvas_rejected() {
        let settings = ExportSettings {
            canvas_px: 0,
            ..Default::default()
        };
        assert!(ExportPipeline::new(settings).is_err());
    }
}
