//! Tesseract OCR engine.

use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat};
use tracing::{debug, info};

use super::OcrEngine;
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// OCR engine backed by the system Tesseract library.
pub struct TesseractEngine {
    tessdata_dir: Option<PathBuf>,
    language: String,
}

impl TesseractEngine {
    /// Create an engine, checking that the language data is present when a
    /// tessdata directory is configured.
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        if let Some(dir) = &config.tessdata_dir {
            for lang in config.language.split('+') {
                let traineddata = dir.join(format!("{}.traineddata", lang));
                if !traineddata.exists() {
                    return Err(OcrError::ModelLoad(format!(
                        "missing Tesseract language data: {}",
                        traineddata.display()
                    )));
                }
            }
        }

        info!("Using Tesseract with language {}", config.language);

        Ok(Self {
            tessdata_dir: config.tessdata_dir.clone(),
            language: config.language.clone(),
        })
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let datapath = match &self.tessdata_dir {
            Some(dir) => Some(
                dir.to_str()
                    .ok_or_else(|| OcrError::ModelLoad("invalid tessdata path".to_string()))?,
            ),
            None => None,
        };

        let text = tesseract::Tesseract::new(datapath, Some(&self.language))
            .map_err(|e| OcrError::ModelLoad(format!("Tesseract init: {}", e)))?
            .set_image_from_mem(png.get_ref())
            .map_err(|e| OcrError::InvalidImage(format!("Tesseract image: {}", e)))?
            .recognize()
            .map_err(|e| OcrError::Recognition(format!("Tesseract recognize: {}", e)))?
            .get_text()
            .map_err(|e| OcrError::Recognition(format!("Tesseract text: {}", e)))?;

        debug!("Tesseract recognized {} characters", text.len());
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}
