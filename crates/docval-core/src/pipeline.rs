//! End-to-end document processing: extract, classify, validate.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::document::{classify, validate};
use crate::error::{ExtractionError, Result};
use crate::extract::{DocumentKind, TextExtractor};
use crate::models::config::DocvalConfig;
use crate::models::document::{DocumentOutcome, ProcessedDocument};
use crate::ocr::{create_engine, OcrEngine};
use crate::pdf::{create_rasterizer, PdfRasterizer};
use crate::storage::WorkDir;

/// Runs documents through extraction, classification and validation.
pub struct DocumentPipeline<E, R> {
    extractor: TextExtractor<E, R>,
}

impl DocumentPipeline<Box<dyn OcrEngine>, Box<dyn PdfRasterizer>> {
    /// Build a pipeline with the engine and page renderer selected in `config`.
    ///
    /// `model_dir` is where the ONNX engine looks for its model files.
    pub fn from_config(config: &DocvalConfig, model_dir: &Path) -> Result<Self> {
        let engine = create_engine(config, model_dir).map_err(ExtractionError::Ocr)?;
        let rasterizer = create_rasterizer(&config.pdf).map_err(ExtractionError::Pdf)?;
        let work_dir = WorkDir::new(&config.storage.work_dir);

        info!("Using OCR engine {}", engine.name());
        Ok(Self::new(TextExtractor::new(
            engine,
            rasterizer,
            config.pdf.clone(),
            work_dir,
        )))
    }
}

impl<E: OcrEngine, R: PdfRasterizer> DocumentPipeline<E, R> {
    pub fn new(extractor: TextExtractor<E, R>) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &TextExtractor<E, R> {
        &self.extractor
    }

    /// Process one document.
    ///
    /// Extraction failures are returned as errors. A document without any
    /// recognizable text yields the no-text outcome with zero elapsed time.
    pub fn process_document(&self, path: &Path, kind: DocumentKind) -> Result<ProcessedDocument> {
        let start = Instant::now();
        info!("Processing {} as {:?}", path.display(), kind);

        let text = self.extractor.extract(path, kind)?;
        Ok(finish(text, start))
    }

    /// Classify and validate text that was already extracted.
    pub fn process_text(&self, text: &str) -> ProcessedDocument {
        process_text(text)
    }
}

/// Classify and validate already-extracted text, without any OCR engine.
pub fn process_text(text: &str) -> ProcessedDocument {
    finish(text.to_string(), Instant::now())
}

fn finish(text: String, start: Instant) -> ProcessedDocument {
    if text.trim().is_empty() {
        warn!("No recognizable text was detected");
        return ProcessedDocument {
            extracted_text: text,
            outcome: DocumentOutcome::no_text(),
            elapsed: Duration::ZERO,
        };
    }

    let document_type = classify(&text);
    let result = validate(&text, document_type);
    let elapsed = start.elapsed();
    info!("Classified as {} in {:?}", document_type, elapsed);

    ProcessedDocument {
        extracted_text: text,
        outcome: DocumentOutcome::Validated(result),
        elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{DocumentType, FieldValue};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_text_is_sentinel() {
        for text in ["", "   ", "\n\t \n"] {
            let doc = process_text(text);
            assert!(doc.outcome.is_no_text());
            assert_eq!(doc.elapsed, Duration::ZERO);
            assert_eq!(doc.outcome.document_type(), DocumentType::Unknown);
        }
    }

    #[test]
    fn test_text_is_classified_and_validated() {
        let doc = process_text("INCOME TAX DEPARTMENT PAN: ABCDE1234F");
        let result = doc.outcome.validation().unwrap();
        assert_eq!(result.document_type(), DocumentType::PanCard);
        assert_eq!(
            result.get("PAN"),
            Some(FieldValue::Matches(&["ABCDE1234F".to_string()]))
        );
        assert_eq!(doc.extracted_text, "INCOME TAX DEPARTMENT PAN: ABCDE1234F");
    }

    #[test]
    fn test_unmatched_text_is_unknown_not_sentinel() {
        let doc = process_text("hello world");
        assert!(!doc.outcome.is_no_text());
        assert_eq!(doc.outcome.document_type(), DocumentType::Unknown);
    }
}
