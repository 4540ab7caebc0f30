//! Error types for the docval-core library.

use thiserror::Error;

/// Main error type for the docval library.
#[derive(Error, Debug)]
pub enum DocvalError {
    /// Text could not be extracted from the document.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error outside of text extraction (staging, config files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failure to turn a document into text.
///
/// Raised when the OCR engine or the PDF rasterizer fails. Never retried.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Image could not be decoded or encoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error while reading the document or writing page images.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract embedded text from the PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// A page could not be rendered.
    #[error("failed to render page: {0}")]
    Render(String),

    /// The page renderer could not be loaded.
    #[error("PDF renderer unavailable: {0}")]
    Renderer(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models or language data.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Result type for the docval library.
pub type Result<T> = std::result::Result<T, DocvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_wraps_ocr_failure() {
        let err: DocvalError = ExtractionError::from(OcrError::Recognition("blank page".into())).into();
        assert_eq!(
            err.to_string(),
            "extraction failed: OCR error: text recognition failed: blank page"
        );
    }

    #[test]
    fn test_pdf_error_messages() {
        assert_eq!(PdfError::Encrypted.to_string(), "PDF is encrypted");
        assert_eq!(PdfError::InvalidPage(4).to_string(), "invalid page number: 4");
    }
}
