//! Configuration structures for the document pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the docval pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocvalConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Working directory configuration.
    pub storage: StorageConfig,

    /// Model configuration.
    pub models: ModelConfig,
}

/// Which OCR engine to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrEngineKind {
    /// Pure Rust ONNX engine (PaddleOCR models).
    #[default]
    Onnx,
    /// Tesseract (requires the `tesseract` feature and installed language data).
    Tesseract,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Engine used for text recognition.
    pub engine: OcrEngineKind,

    /// Tesseract language(s), e.g. "eng" or "eng+hin".
    pub language: String,

    /// Tesseract data directory. `None` uses the system default.
    pub tessdata_dir: Option<PathBuf>,

    /// Keep `[UNK]` tokens emitted by the ONNX recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: OcrEngineKind::Onnx,
            language: "eng".to_string(),
            tessdata_dir: None,
            keep_unk: false,
        }
    }
}

/// How PDF pages are turned into images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfRendererKind {
    /// PDFium when its library can be loaded, otherwise lopdf.
    #[default]
    Auto,
    /// Full page rendering with PDFium (requires the PDFium shared library).
    Pdfium,
    /// Embedded scans only, extracted with lopdf.
    Lopdf,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rasterizing PDF pages to images.
    pub render_dpi: u32,

    /// Page renderer.
    pub renderer: PdfRendererKind,

    /// Path to the PDFium shared library. `None` searches the usual places.
    pub pdfium_library: Option<PathBuf>,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,

    /// Use embedded PDF text instead of OCR when there is enough of it.
    pub prefer_embedded_text: bool,

    /// Minimum embedded text length to skip OCR.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            renderer: PdfRendererKind::Auto,
            pdfium_library: None,
            max_pages: 0,
            prefer_embedded_text: false,
            min_text_length: 50,
        }
    }
}

/// Working directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for staged documents and rasterized page images.
    pub work_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("uploads"),
        }
    }
}

/// Model file locations for the ONNX engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files. `None` uses the active downloaded variant.
    pub model_dir: Option<PathBuf>,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Base URL `docval models download` fetches from. `None` uses the built-in host.
    pub download_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            download_url: None,
        }
    }
}

impl DocvalConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = DocvalConfig::default();
        assert_eq!(config.pdf.render_dpi, 300);
        assert_eq!(config.ocr.engine, OcrEngineKind::Onnx);
        assert_eq!(config.storage.work_dir, PathBuf::from("uploads"));
        assert!(!config.pdf.prefer_embedded_text);
        assert_eq!(config.pdf.renderer, PdfRendererKind::Auto);
    }

    #[test]
    fn test_renderer_names() {
        let config: DocvalConfig =
            serde_json::from_str(r#"{"pdf": {"renderer": "lopdf"}}"#).unwrap();
        assert_eq!(config.pdf.renderer, PdfRendererKind::Lopdf);
        assert_eq!(
            serde_json::to_string(&PdfRendererKind::Pdfium).unwrap(),
            "\"pdfium\""
        );
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: DocvalConfig =
            serde_json::from_str(r#"{"ocr": {"engine": "tesseract"}, "pdf": {"max_pages": 3}}"#).unwrap();
        assert_eq!(config.ocr.engine, OcrEngineKind::Tesseract);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.pdf.max_pages, 3);
        assert_eq!(config.pdf.render_dpi, 300);
        assert_eq!(config.models.recognition_model, "latin_rec.onnx");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = DocvalConfig::default();
        config.pdf.render_dpi = 150;
        config.save(&path).unwrap();

        let loaded = DocvalConfig::from_file(&path).unwrap();
        assert_eq!(loaded.pdf.render_dpi, 150);
    }

    #[test]
    fn test_invalid_json_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = DocvalConfig::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
