//! Full page rendering through Google PDFium.
//!
//! Every page is drawn as a whole: scans, vector text, stamps and form
//! fields alike. A `Pdfium` handle is bound per call because the upstream
//! type is `!Send`; the OS caches the library load.

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;
use tracing::{debug, info, warn};

use super::{PdfRasterizer, Result, POINTS_PER_INCH};
use crate::error::PdfError;

/// Largest width or height of a rendered page, in pixels.
const MAX_DIMENSION_PX: u32 = 8192;

/// Renders PDF pages with PDFium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library: Option<PathBuf>,
    max_pages: usize,
}

impl PdfiumRasterizer {
    /// Create a renderer, failing early when the PDFium library cannot be loaded.
    ///
    /// `library` is an explicit path to the PDFium shared library. Without it,
    /// `PDFIUM_DYNAMIC_LIB_PATH`, the executable's directory and the system
    /// search paths are tried in that order.
    pub fn new(library: Option<&Path>) -> Result<Self> {
        let rasterizer = Self {
            library: library.map(Path::to_path_buf),
            max_pages: 0,
        };
        rasterizer.load()?;
        Ok(rasterizer)
    }

    /// Limit the number of pages rendered (0 = unlimited).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    fn load(&self) -> Result<Pdfium> {
        if let Some(path) = &self.library {
            return bind_at(&path.to_string_lossy());
        }

        if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
            debug!("Loading PDFium from PDFIUM_DYNAMIC_LIB_PATH={}", path);
            return bind_at(&path);
        }

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            let lib_path = Pdfium::pdfium_platform_library_name_at_path(
                exe_dir.to_string_lossy().as_ref(),
            );
            if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                debug!("Loaded PDFium from {}", exe_dir.display());
                return Ok(Pdfium::new(bindings));
            }
        }

        let bindings = Pdfium::bind_to_system_library().map_err(|e| {
            PdfError::Renderer(format!(
                "PDFium library not found; set pdf.pdfium_library or PDFIUM_DYNAMIC_LIB_PATH: {}",
                e
            ))
        })?;
        Ok(Pdfium::new(bindings))
    }
}

fn bind_at(path: &str) -> Result<Pdfium> {
    let path = path.to_string();
    let bindings = Pdfium::bind_to_library(&path)
        .map_err(|e| PdfError::Renderer(format!("failed to load PDFium from {}: {}", path, e)))?;
    Ok(Pdfium::new(bindings))
}

/// Password and encryption failures become [`PdfError::Encrypted`].
fn map_load_error(e: PdfiumError) -> PdfError {
    let message = e.to_string();
    let lower = message.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        PdfError::Encrypted
    } else {
        PdfError::Parse(message)
    }
}

/// Pixel size of a page at `dpi`, capped at [`MAX_DIMENSION_PX`] with the
/// aspect ratio kept. Both sides are at least one pixel.
fn render_dimensions(width_pt: f32, height_pt: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let raw_w = (width_pt * scale).round().max(1.0);
    let raw_h = (height_pt * scale).round().max(1.0);

    let longest = raw_w.max(raw_h);
    if longest <= MAX_DIMENSION_PX as f32 {
        return (raw_w as u32, raw_h as u32);
    }

    let shorter = |side: f32| ((side * MAX_DIMENSION_PX as f32 / longest) as u32).max(1);
    if raw_w >= raw_h {
        (MAX_DIMENSION_PX, shorter(raw_h))
    } else {
        (shorter(raw_w), MAX_DIMENSION_PX)
    }
}

impl PdfRasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>> {
        let data = std::fs::read(pdf_path)
            .map_err(|e| PdfError::Parse(format!("{}: {}", pdf_path.display(), e)))?;

        let pdfium = self.load()?;
        let document = pdfium
            .load_pdf_from_byte_slice(&data, None)
            .map_err(map_load_error)?;

        let pages = document.pages();
        let mut page_count = pages.len() as usize;
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }
        if self.max_pages > 0 && page_count > self.max_pages {
            debug!("Limiting rendering to {} of {} pages", self.max_pages, page_count);
            page_count = self.max_pages;
        }

        info!("Rendering {} pages at {} dpi", page_count, dpi);

        let mut images = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let page_number = index as u32 + 1;
            let page = u16::try_from(index)
                .ok()
                .and_then(|i| pages.get(i).ok())
                .ok_or(PdfError::InvalidPage(page_number))?;

            let (width, height) = render_dimensions(page.width().value, page.height().value, dpi);
            if width == MAX_DIMENSION_PX || height == MAX_DIMENSION_PX {
                warn!("Page {} capped to {}x{} pixels", page_number, width, height);
            }

            let config = PdfRenderConfig::new()
                .set_target_width(width as i32)
                .set_maximum_height(height as i32);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| PdfError::Render(format!("page {}: {}", page_number, e)))?;

            let (w, h) = (bitmap.width() as u32, bitmap.height() as u32);
            let pixels = RgbaImage::from_raw(w, h, bitmap.as_rgba_bytes()).ok_or_else(|| {
                PdfError::Render(format!("page {}: bitmap size mismatch", page_number))
            })?;

            debug!("Rendered page {} to {}x{}", page_number, w, h);
            images.push(DynamicImage::ImageRgba8(pixels));
        }

        Ok(images)
    }
}
