//! Text extraction from images and PDFs.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, ImageFormat};
use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::models::config::PdfConfig;
use crate::ocr::OcrEngine;
use crate::pdf::{PdfDocument, PdfRasterizer};
use crate::storage::WorkDir;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// How a document is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// A raster image (PNG, JPEG, ...).
    Image,
    /// A PDF whose pages are rasterized before OCR.
    Pdf,
}

impl DocumentKind {
    /// Guess the kind from a file extension. Anything that is not `.pdf` is
    /// treated as an image.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => DocumentKind::Pdf,
            _ => DocumentKind::Image,
        }
    }
}

/// Turns a document on disk into plain text.
///
/// PDF pages are written to the working directory as `temp_page_{i}.jpg`
/// before recognition and are left there afterwards.
pub struct TextExtractor<E, R> {
    engine: E,
    rasterizer: R,
    pdf: PdfConfig,
    work_dir: WorkDir,
}

impl<E: OcrEngine, R: PdfRasterizer> TextExtractor<E, R> {
    pub fn new(engine: E, rasterizer: R, pdf: PdfConfig, work_dir: WorkDir) -> Self {
        Self {
            engine,
            rasterizer,
            pdf,
            work_dir,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn work_dir(&self) -> &WorkDir {
        &self.work_dir
    }

    /// Extract all text from the document at `path`.
    ///
    /// Any page failure aborts the whole document.
    pub fn extract(&self, path: &Path, kind: DocumentKind) -> Result<String> {
        match kind {
            DocumentKind::Pdf => self.extract_pdf(path),
            DocumentKind::Image => self.extract_image(path),
        }
    }

    fn extract_image(&self, path: &Path) -> Result<String> {
        info!("Running {} on image {}", self.engine.name(), path.display());
        let image = image::open(path)?;
        let text = self.engine.recognize(&image)?;
        debug!("Recognized {} characters", text.len());
        Ok(text)
    }

    fn extract_pdf(&self, path: &Path) -> Result<String> {
        if self.pdf.prefer_embedded_text {
            if let Some(text) = self.embedded_text(path) {
                return Ok(text);
            }
        }

        let start = Instant::now();
        let pages = self.rasterizer.rasterize(path, self.pdf.render_dpi)?;
        info!(
            "Rasterized {} pages at {} dpi in {:?}",
            pages.len(),
            self.pdf.render_dpi,
            start.elapsed()
        );

        self.work_dir.ensure()?;

        let mut text = String::new();
        for (index, page) in pages.iter().enumerate() {
            self.save_page_image(index, page)?;
            let page_text = self.engine.recognize(page)?;
            debug!("Page {}: {} characters", index + 1, page_text.len());
            text.push_str(&page_text);
        }

        info!("OCR complete: {} pages, {} characters", pages.len(), text.len());
        Ok(text)
    }

    /// Embedded text, if the PDF carries enough of it to skip OCR.
    fn embedded_text(&self, path: &Path) -> Option<String> {
        let text = match PdfDocument::open(path).and_then(|doc| doc.embedded_text()) {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not read embedded text, using OCR: {}", e);
                return None;
            }
        };

        let length = text.trim().chars().count();
        if length < self.pdf.min_text_length {
            debug!(
                "Embedded text too short ({} < {}), using OCR",
                length, self.pdf.min_text_length
            );
            return None;
        }

        info!("Using {} characters of embedded PDF text", length);
        Some(text)
    }

    fn save_page_image(&self, index: usize, page: &DynamicImage) -> Result<()> {
        let path = self.work_dir.page_image_path(index);
        // JPEG has no alpha channel
        DynamicImage::ImageRgb8(page.to_rgb8()).save_with_format(&path, ImageFormat::Jpeg)?;
        debug!("Saved page image {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, PdfError};
    use crate::pdf::LopdfRasterizer;
    use image::{GrayImage, Luma};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// Reports the top-left pixel value of every image it sees.
    struct PixelEngine {
        seen: RefCell<Vec<u8>>,
    }

    impl PixelEngine {
        fn new() -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl OcrEngine for PixelEngine {
        fn recognize(&self, image: &DynamicImage) -> std::result::Result<String, OcrError> {
            let value = image.to_luma8().get_pixel(0, 0).0[0];
            self.seen.borrow_mut().push(value);
            Ok(format!("[{}]", value))
        }

        fn name(&self) -> &'static str {
            "pixel"
        }
    }

    struct FailingEngine;

    impl OcrEngine for FailingEngine {
        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<String, OcrError> {
            Err(OcrError::Recognition("engine offline".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct StaticPages(Vec<u8>);

    impl PdfRasterizer for StaticPages {
        fn rasterize(&self, _pdf_path: &Path, _dpi: u32) -> crate::pdf::Result<Vec<DynamicImage>> {
            Ok(self
                .0
                .iter()
                .map(|&v| DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([v]))))
                .collect())
        }
    }

    struct BrokenRasterizer;

    impl PdfRasterizer for BrokenRasterizer {
        fn rasterize(&self, _pdf_path: &Path, _dpi: u32) -> crate::pdf::Result<Vec<DynamicImage>> {
            Err(PdfError::Parse("truncated file".to_string()))
        }
    }

    fn extractor<E: OcrEngine, R: PdfRasterizer>(
        engine: E,
        rasterizer: R,
        dir: &Path,
    ) -> TextExtractor<E, R> {
        TextExtractor::new(engine, rasterizer, PdfConfig::default(), WorkDir::new(dir.join("uploads")))
    }

    #[test]
    fn test_kind_from_path() {
        assert_eq!(DocumentKind::from_path(Path::new("scan.pdf")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("SCAN.PDF")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("card.jpg")), DocumentKind::Image);
        assert_eq!(DocumentKind::from_path(Path::new("no_extension")), DocumentKind::Image);
    }

    #[test]
    fn test_pdf_pages_concatenated_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor(PixelEngine::new(), StaticPages(vec![10, 200, 90]), dir.path());

        let text = extractor.extract(Path::new("doc.pdf"), DocumentKind::Pdf).unwrap();

        assert_eq!(text, "[10][200][90]");
        assert_eq!(*extractor.engine().seen.borrow(), vec![10, 200, 90]);
    }

    #[test]
    fn test_pdf_page_images_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor(PixelEngine::new(), StaticPages(vec![0, 255]), dir.path());

        extractor.extract(Path::new("doc.pdf"), DocumentKind::Pdf).unwrap();

        let work_dir = extractor.work_dir();
        for index in 0..2 {
            let page = image::open(work_dir.page_image_path(index)).unwrap();
            assert_eq!((page.width(), page.height()), (4, 4));
        }
        assert!(!work_dir.page_image_path(2).exists());
    }

    #[test]
    fn test_image_is_recognized_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.png");
        GrayImage::from_pixel(6, 3, Luma([77])).save(&path).unwrap();

        let extractor = extractor(PixelEngine::new(), BrokenRasterizer, dir.path());
        let text = extractor.extract(&path, DocumentKind::Image).unwrap();

        assert_eq!(text, "[77]");
        assert!(!extractor.work_dir().path().exists());
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor(PixelEngine::new(), BrokenRasterizer, dir.path());
        let missing: PathBuf = dir.path().join("missing.png");

        assert!(extractor.extract(&missing, DocumentKind::Image).is_err());
    }

    #[test]
    fn test_rasterizer_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor(PixelEngine::new(), BrokenRasterizer, dir.path());

        let err = extractor.extract(Path::new("doc.pdf"), DocumentKind::Pdf).unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(PdfError::Parse(_))));
        assert!(extractor.engine().seen.borrow().is_empty());
    }

    #[test]
    fn test_ocr_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor(FailingEngine, StaticPages(vec![1, 2]), dir.path());

        let err = extractor.extract(Path::new("doc.pdf"), DocumentKind::Pdf).unwrap_err();
        assert_eq!(err.to_string(), "OCR error: text recognition failed: engine offline");
        assert!(extractor.work_dir().page_image_path(0).exists());
        assert!(!extractor.work_dir().page_image_path(1).exists());
    }

    #[test]
    fn test_unreadable_embedded_text_falls_back_to_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = PdfConfig {
            prefer_embedded_text: true,
            ..PdfConfig::default()
        };
        let extractor = TextExtractor::new(
            PixelEngine::new(),
            StaticPages(vec![5]),
            pdf,
            WorkDir::new(dir.path().join("uploads")),
        );

        let text = extractor.extract(&dir.path().join("missing.pdf"), DocumentKind::Pdf).unwrap();
        assert_eq!(text, "[5]");
    }

    #[test]
    fn test_scanned_pdf_through_lopdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, crate::pdf::tests::scanned_pdf(2)).unwrap();

        let pdf = PdfConfig {
            render_dpi: 72,
            ..PdfConfig::default()
        };
        let extractor = TextExtractor::new(
            PixelEngine::new(),
            LopdfRasterizer::new(),
            pdf,
            WorkDir::new(dir.path().join("uploads")),
        );

        let text = extractor.extract(&path, DocumentKind::Pdf).unwrap();
        assert_eq!(text, "[40][80]");
    }
}
