//! WASM bindings for document classification and field validation.
//!
//! OCR runs on the JavaScript side; this crate classifies and validates the
//! recognized text in browsers and Node.js.

use wasm_bindgen::prelude::*;

use docval_core::models::document::DocumentType;
use docval_core::ocr::{OcrResult, TextBox};
use docval_core::{classify, process_text, validate};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Classify text and return the document type label (e.g. "PAN Card").
#[wasm_bindgen]
pub fn classify_text(text: &str) -> String {
    classify(text).label().to_string()
}

/// Classify and validate text.
///
/// Returns `{ extracted_text, results, elapsed_seconds }`; `results` is the
/// no-text message when the text is blank.
#[wasm_bindgen]
pub fn validate_text(text: &str) -> Result<JsValue, JsValue> {
    to_js(&process_text(text))
}

/// All document type labels, classifier priority order first.
#[wasm_bindgen]
pub fn document_types() -> js_sys::Array {
    DocumentType::ALL
        .iter()
        .map(|t| JsValue::from_str(t.label()))
        .collect()
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Document validator class for browser use.
#[wasm_bindgen]
pub struct DocumentValidator {
    debug: bool,
}

#[wasm_bindgen]
impl DocumentValidator {
    /// Create a new validator.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { debug: false }
    }

    /// Log each classification to the browser console.
    #[wasm_bindgen]
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Classify text.
    #[wasm_bindgen]
    pub fn classify(&self, text: &str) -> String {
        let document_type = classify(text);
        if self.debug {
            web_sys::console::debug_1(&format!("docval: classified as {}", document_type).into());
        }
        document_type.label().to_string()
    }

    /// Classify and validate text.
    #[wasm_bindgen]
    pub fn validate(&self, text: &str) -> Result<JsValue, JsValue> {
        let processed = process_text(text);
        if self.debug {
            web_sys::console::debug_1(
                &format!("docval: {}", processed.outcome.document_type()).into(),
            );
        }
        to_js(&processed.outcome)
    }

    /// Validate text as a given document type, skipping classification.
    #[wasm_bindgen]
    pub fn validate_as(&self, text: &str, document_type: &str) -> Result<JsValue, JsValue> {
        let document_type = DocumentType::from_label(document_type)
            .ok_or_else(|| JsValue::from_str(&format!("unknown document type: {}", document_type)))?;
        to_js(&validate(text, document_type))
    }
}

impl Default for DocumentValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Text boxes recognized by a browser-side OCR engine.
#[wasm_bindgen]
pub struct OcrTextJs {
    boxes: Vec<TextBox>,
}

#[wasm_bindgen]
impl OcrTextJs {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { boxes: Vec::new() }
    }

    /// Add a recognized text box (quadrilateral corners, clockwise from top-left).
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_box(
        &mut self,
        text: &str,
        x1: f32, y1: f32,
        x2: f32, y2: f32,
        x3: f32, y3: f32,
        x4: f32, y4: f32,
        confidence: f32,
    ) {
        self.boxes.push(TextBox {
            bbox: [x1, y1, x2, y2, x3, y3, x4, y4],
            text: text.to_string(),
            confidence,
        });
    }

    /// Text of all boxes in reading order, one box per line.
    #[wasm_bindgen]
    pub fn get_text(&self) -> String {
        OcrResult::from_boxes(self.boxes.clone(), 0, (0, 0)).text
    }

    /// Classify and validate the collected text.
    #[wasm_bindgen]
    pub fn validate(&self) -> Result<JsValue, JsValue> {
        validate_text(&self.get_text())
    }
}

impl Default for OcrTextJs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_classify_text() {
        assert_eq!(classify_text("INCOME TAX DEPARTMENT"), "PAN Card");
        assert_eq!(classify_text("hello"), "Unknown Document");
    }

    #[wasm_bindgen_test]
    fn test_validator_classify() {
        let validator = DocumentValidator::new();
        assert_eq!(validator.classify("Tax Invoice INV001"), "Invoice");
    }

    #[wasm_bindgen_test]
    fn test_validate_as_rejects_unknown_label() {
        let validator = DocumentValidator::new();
        assert!(validator.validate_as("text", "Passport").is_err());
        assert!(validator.validate_as("text", "Contract").is_ok());
    }

    #[wasm_bindgen_test]
    fn test_boxes_in_reading_order() {
        let mut ocr = OcrTextJs::new();
        ocr.add_box("ABCDE1234F", 10.0, 60.0, 90.0, 60.0, 90.0, 70.0, 10.0, 70.0, 0.9);
        ocr.add_box("INCOME TAX DEPARTMENT", 10.0, 10.0, 90.0, 10.0, 90.0, 20.0, 10.0, 20.0, 0.9);
        assert_eq!(ocr.get_text(), "INCOME TAX DEPARTMENT\nABCDE1234F");
    }
}
