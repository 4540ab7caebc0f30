//! PDF page rasterization.

#[cfg(feature = "native")]
mod pdfium;
mod rasterizer;

#[cfg(feature = "native")]
pub use pdfium::PdfiumRasterizer;
pub use rasterizer::{LopdfRasterizer, PdfDocument};

#[cfg(test)]
pub(crate) use rasterizer::tests;

use std::path::Path;

use crate::error::PdfError;
use crate::models::config::{PdfConfig, PdfRendererKind};
use image::DynamicImage;
use tracing::{info, warn};

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Points per inch in PDF user space.
const POINTS_PER_INCH: f32 = 72.0;

/// Converts the pages of a PDF into images suitable for OCR.
pub trait PdfRasterizer {
    /// Rasterize every page, in page order, at the given resolution.
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>>;
}

impl<R: PdfRasterizer + ?Sized> PdfRasterizer for Box<R> {
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>> {
        (**self).rasterize(pdf_path, dpi)
    }
}

/// Create the rasterizer selected in the configuration.
///
/// `auto` renders with PDFium when its library loads and otherwise falls
/// back to the scan-only lopdf rasterizer.
pub fn create_rasterizer(config: &PdfConfig) -> Result<Box<dyn PdfRasterizer>> {
    match config.renderer {
        PdfRendererKind::Pdfium => pdfium_rasterizer(config),
        PdfRendererKind::Lopdf => Ok(lopdf_rasterizer(config)),
        PdfRendererKind::Auto => pdfium_rasterizer(config).or_else(|e| {
            warn!("{}; pages without an embedded scan will render blank", e);
            Ok(lopdf_rasterizer(config))
        }),
    }
}

fn lopdf_rasterizer(config: &PdfConfig) -> Box<dyn PdfRasterizer> {
    info!("Rasterizing PDF pages from embedded scans");
    Box::new(LopdfRasterizer::new().with_max_pages(config.max_pages))
}

#[cfg(feature = "native")]
fn pdfium_rasterizer(config: &PdfConfig) -> Result<Box<dyn PdfRasterizer>> {
    let rasterizer = PdfiumRasterizer::new(config.pdfium_library.as_deref())?
        .with_max_pages(config.max_pages);
    info!("Rendering PDF pages with PDFium");
    Ok(Box::new(rasterizer))
}

#[cfg(not(feature = "native"))]
fn pdfium_rasterizer(_config: &PdfConfig) -> Result<Box<dyn PdfRasterizer>> {
    Err(PdfError::Renderer(
        "PDFium not available: built without the `native` feature".to_string(),
    ))
}

#[cfg(test)]
mod create_tests {
    use super::*;
    use image::GenericImageView;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_auto_renders_text_only_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("born_digital.pdf");
        std::fs::write(&path, tests::text_only_pdf()).unwrap();

        let rasterizer = create_rasterizer(&PdfConfig::default()).unwrap();
        let pages = rasterizer.rasterize(&path, 300).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].dimensions().0, 2550);
    }

    #[test]
    fn test_explicit_pdfium_with_missing_library_fails() {
        let config = PdfConfig {
            renderer: PdfRendererKind::Pdfium,
            pdfium_library: Some(PathBuf::from("/nonexistent/libpdfium.so")),
            ..PdfConfig::default()
        };
        assert!(matches!(create_rasterizer(&config), Err(PdfError::Renderer(_))));
    }

    #[test]
    fn test_auto_falls_back_when_library_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, tests::scanned_pdf(2)).unwrap();

        let config = PdfConfig {
            pdfium_library: Some(PathBuf::from("/nonexistent/libpdfium.so")),
            ..PdfConfig::default()
        };
        let pages = create_rasterizer(&config).unwrap().rasterize(&path, 72).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].to_luma8().get_pixel(0, 0).0, [80]);
    }
}
