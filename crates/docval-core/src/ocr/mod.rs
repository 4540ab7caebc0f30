//! OCR engines.
//!
//! Text recognition is delegated to an external engine behind the
//! [`OcrEngine`] trait: the pure Rust ONNX engine (`native` feature) or
//! Tesseract (`tesseract` feature).

#[cfg(feature = "native")]
mod pure_engine;
#[cfg(feature = "tesseract")]
mod tesseract_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;
#[cfg(feature = "tesseract")]
pub use tesseract_engine::TesseractEngine;

use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::models::config::{DocvalConfig, OcrEngineKind};

/// Turns a raster image into text.
pub trait OcrEngine {
    /// Recognize all text in the image.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;

    /// Short engine name for logs and reports.
    fn name(&self) -> &'static str;
}

impl<E: OcrEngine + ?Sized> OcrEngine for Box<E> {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        (**self).recognize(image)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// A recognized text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of box-level OCR on an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Recognized text boxes.
    pub boxes: Vec<TextBox>,

    /// Full text (boxes joined with newlines).
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Create a result from boxes, sorting them into reading order.
    pub fn from_boxes(boxes: Vec<TextBox>, processing_time_ms: u64, image_size: (u32, u32)) -> Self {
        let mut result = Self {
            boxes,
            text: String::new(),
            processing_time_ms,
            image_size,
        };
        result.sort_by_reading_order();
        result
    }

    /// Sort boxes by reading order (top-to-bottom, left-to-right).
    pub fn sort_by_reading_order(&mut self) {
        self.boxes.sort_by(|a, b| {
            let (_, ay, _, _) = a.rect();
            let (_, by, _, _) = b.rect();

            // Group by approximate vertical position (within 20 pixels)
            let row_a = (ay / 20.0) as i32;
            let row_b = (by / 20.0) as i32;

            if row_a != row_b {
                row_a.cmp(&row_b)
            } else {
                let (ax, _, _, _) = a.rect();
                let (bx, _, _, _) = b.rect();
                ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
            }
        });

        self.text = self
            .boxes
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }
}

/// Create the engine selected in the configuration.
///
/// `model_dir` holds the ONNX model files; it is ignored by Tesseract.
pub fn create_engine(
    config: &DocvalConfig,
    model_dir: &Path,
) -> Result<Box<dyn OcrEngine>, OcrError> {
    match config.ocr.engine {
        OcrEngineKind::Onnx => create_onnx_engine(config, model_dir),
        OcrEngineKind::Tesseract => create_tesseract_engine(config),
    }
}

#[cfg(feature = "native")]
fn create_onnx_engine(
    config: &DocvalConfig,
    model_dir: &Path,
) -> Result<Box<dyn OcrEngine>, OcrError> {
    Ok(Box::new(PureOcrEngine::from_dir(
        model_dir,
        &config.models,
        config.ocr.clone(),
    )?))
}

#[cfg(not(feature = "native"))]
fn create_onnx_engine(
    _config: &DocvalConfig,
    _model_dir: &Path,
) -> Result<Box<dyn OcrEngine>, OcrError> {
    Err(OcrError::ModelLoad(
        "ONNX engine not available: built without the `native` feature".to_string(),
    ))
}

#[cfg(feature = "tesseract")]
fn create_tesseract_engine(config: &DocvalConfig) -> Result<Box<dyn OcrEngine>, OcrError> {
    Ok(Box::new(TesseractEngine::new(&config.ocr)?))
}

#[cfg(not(feature = "tesseract"))]
fn create_tesseract_engine(_config: &DocvalConfig) -> Result<Box<dyn OcrEngine>, OcrError> {
    Err(OcrError::ModelLoad(
        "Tesseract engine not available: built without the `tesseract` feature".to_string(),
    ))
}
