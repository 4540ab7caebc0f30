//! Core library for OCR-based document classification and validation.
//!
//! This crate provides:
//! - Text extraction from images and scanned PDFs through a pluggable OCR engine
//! - Keyword-based document classification (PAN card, invoice, certificate, ...)
//! - Regex field extraction per document type
//! - A pipeline tying the three together

pub mod document;
pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod storage;

pub use document::{classify, validate};
pub use error::{DocvalError, ExtractionError, OcrError, PdfError, Result};
pub use extract::{DocumentKind, TextExtractor};
pub use models::config::DocvalConfig;
pub use models::document::{
    DocumentFields, DocumentOutcome, DocumentType, FieldValue, ProcessedDocument, ValidationResult,
};
pub use ocr::{create_engine, OcrEngine};
pub use pdf::{create_rasterizer, LopdfRasterizer, PdfRasterizer};
pub use pipeline::{process_text, DocumentPipeline};
pub use storage::WorkDir;

#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
#[cfg(feature = "native")]
pub use pdf::PdfiumRasterizer;
#[cfg(feature = "tesseract")]
pub use ocr::TesseractEngine;
