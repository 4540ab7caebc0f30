//! Subcommands and the helpers they share.

pub mod batch;
pub mod clean;
pub mod config;
pub mod models;
pub mod process;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use docval_core::models::config::{DocvalConfig, OcrEngineKind};
use docval_core::{DocumentPipeline, DocvalError, ExtractionError, OcrEngine, PdfRasterizer};

/// Pipeline type used by the CLI.
pub type Pipeline = DocumentPipeline<Box<dyn OcrEngine>, Box<dyn PdfRasterizer>>;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docval")
        .join("config.json")
}

/// Load configuration from `path`, or from the default location if a file
/// exists there, or fall back to defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<DocvalConfig> {
    if let Some(path) = path {
        return DocvalConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to read config file {}", path));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        DocvalConfig::from_file(&default_path)
            .with_context(|| format!("Failed to read config file {}", default_path.display()))
    } else {
        Ok(DocvalConfig::default())
    }
}

/// Model directory: command line first, then config, then the active variant.
pub fn resolve_model_dir(cli: Option<&Path>, config: &DocvalConfig) -> PathBuf {
    cli.map(Path::to_path_buf)
        .or_else(|| config.models.model_dir.clone())
        .unwrap_or_else(|| models::variant_dir(models::active_variant()))
}

/// Build the document pipeline, with a hint about missing models.
pub fn build_pipeline(config: &DocvalConfig, model_dir: &Path) -> anyhow::Result<Pipeline> {
    DocumentPipeline::from_config(config, model_dir).map_err(|e| {
        if let DocvalError::Extraction(ExtractionError::Pdf(_)) = e {
            return anyhow::anyhow!(
                "{}\n\nInstall PDFium, set pdf.pdfium_library, or set pdf.renderer to \"auto\".",
                e
            );
        }
        let hint = match config.ocr.engine {
            OcrEngineKind::Onnx => format!(
                "Run 'docval models download' or pass --model-dir (looked in {}).",
                model_dir.display()
            ),
            OcrEngineKind::Tesseract => {
                "Install Tesseract language data or set ocr.tessdata_dir.".to_string()
            }
        };
        anyhow::anyhow!("{}\n\n{}", e, hint)
    })
}
