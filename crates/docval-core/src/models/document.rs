//! Document classification and validation result models.

use std::fmt;
use std::time::Duration;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

/// Message reported when OCR produced no usable text.
pub const NO_TEXT_MESSAGE: &str = "No recognizable text was detected.";

/// Coarse document type assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Income tax PAN card.
    #[serde(rename = "PAN Card")]
    PanCard,
    /// Invoice.
    #[serde(rename = "Invoice")]
    Invoice,
    /// Certificate (course, achievement, ...).
    #[serde(rename = "Certificate")]
    Certificate,
    /// Contract or agreement.
    #[serde(rename = "Contract")]
    Contract,
    /// Aadhar identity card.
    #[serde(rename = "Aadhar Card")]
    AadharCard,
    /// No keyword group matched.
    #[serde(rename = "Unknown Document")]
    Unknown,
}

impl DocumentType {
    /// All document types, classifier priority order first.
    pub const ALL: [DocumentType; 6] = [
        DocumentType::PanCard,
        DocumentType::Invoice,
        DocumentType::Certificate,
        DocumentType::Contract,
        DocumentType::AadharCard,
        DocumentType::Unknown,
    ];

    /// Human-readable label, also used as the serialized value.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::PanCard => "PAN Card",
            DocumentType::Invoice => "Invoice",
            DocumentType::Certificate => "Certificate",
            DocumentType::Contract => "Contract",
            DocumentType::AadharCard => "Aadhar Card",
            DocumentType::Unknown => "Unknown Document",
        }
    }

    /// Parse a label produced by [`DocumentType::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Type-specific fields, one variant per document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFields {
    PanCard {
        pan: Vec<String>,
    },
    Invoice {
        invoice_numbers: Vec<String>,
        amounts: Vec<String>,
    },
    Certificate {
        issued_to: Vec<String>,
    },
    Contract {
        dates: Vec<String>,
    },
    AadharCard {
        aadhar_numbers: Vec<String>,
    },
    Unknown,
}

impl DocumentFields {
    /// Document type these fields belong to.
    pub fn document_type(&self) -> DocumentType {
        match self {
            DocumentFields::PanCard { .. } => DocumentType::PanCard,
            DocumentFields::Invoice { .. } => DocumentType::Invoice,
            DocumentFields::Certificate { .. } => DocumentType::Certificate,
            DocumentFields::Contract { .. } => DocumentType::Contract,
            DocumentFields::AadharCard { .. } => DocumentType::AadharCard,
            DocumentFields::Unknown => DocumentType::Unknown,
        }
    }

    /// Display keys and matches, in display order.
    pub fn entries(&self) -> Vec<(&'static str, &[String])> {
        match self {
            DocumentFields::PanCard { pan } => vec![("PAN", pan.as_slice())],
            DocumentFields::Invoice {
                invoice_numbers,
                amounts,
            } => vec![
                ("Invoice No", invoice_numbers.as_slice()),
                ("Amount", amounts.as_slice()),
            ],
            DocumentFields::Certificate { issued_to } => vec![("Issued To", issued_to.as_slice())],
            DocumentFields::Contract { dates } => vec![("Dates", dates.as_slice())],
            DocumentFields::AadharCard { aadhar_numbers } => {
                vec![("Aadhar Number", aadhar_numbers.as_slice())]
            }
            DocumentFields::Unknown => Vec::new(),
        }
    }
}

/// A single value in the rendered result mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    DocumentType(DocumentType),
    Matches(&'a [String]),
    Message(&'a str),
}

impl Serialize for FieldValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::DocumentType(doc_type) => doc_type.serialize(serializer),
            FieldValue::Matches(matches) => matches.serialize(serializer),
            FieldValue::Message(message) => serializer.serialize_str(message),
        }
    }
}

/// Structured fields extracted from a classified document.
///
/// Built only by [`crate::document::validate`], so the document type always
/// matches the type that was passed in and the field variant agrees with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub(crate) document_type: DocumentType,
    pub(crate) fields: DocumentFields,
    pub(crate) emails: Vec<String>,
    pub(crate) phone_numbers: Vec<String>,
}

impl ValidationResult {
    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn fields(&self) -> &DocumentFields {
        &self.fields
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    pub fn phone_numbers(&self) -> &[String] {
        &self.phone_numbers
    }

    /// Ordered key/value view: document type, type-specific keys, emails, phones.
    pub fn entries(&self) -> Vec<(&'static str, FieldValue<'_>)> {
        let mut entries = vec![("Document Type", FieldValue::DocumentType(self.document_type))];
        entries.extend(
            self.fields
                .entries()
                .into_iter()
                .map(|(key, matches)| (key, FieldValue::Matches(matches))),
        );
        entries.push(("Emails", FieldValue::Matches(&self.emails)));
        entries.push(("Phone Numbers", FieldValue::Matches(&self.phone_numbers)));
        entries
    }

    /// Look up a value by display key.
    pub fn get(&self, key: &str) -> Option<FieldValue<'_>> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value)
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_entries(&self.entries(), serializer)
    }
}

/// Outcome of the classification and validation stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Text was found, classified and validated.
    Validated(ValidationResult),
    /// OCR produced no usable text; nothing was classified.
    NoText { message: String },
}

impl DocumentOutcome {
    /// The sentinel outcome for documents without text.
    pub fn no_text() -> Self {
        DocumentOutcome::NoText {
            message: NO_TEXT_MESSAGE.to_string(),
        }
    }

    pub fn document_type(&self) -> DocumentType {
        match self {
            DocumentOutcome::Validated(result) => result.document_type(),
            DocumentOutcome::NoText { .. } => DocumentType::Unknown,
        }
    }

    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            DocumentOutcome::Validated(result) => Some(result),
            DocumentOutcome::NoText { .. } => None,
        }
    }

    pub fn is_no_text(&self) -> bool {
        matches!(self, DocumentOutcome::NoText { .. })
    }

    pub fn entries(&self) -> Vec<(&'static str, FieldValue<'_>)> {
        match self {
            DocumentOutcome::Validated(result) => result.entries(),
            // Same label as an unclassified document, not a bare "Unknown",
            // so consumers only ever see one unknown type.
            DocumentOutcome::NoText { message } => vec![
                ("Document Type", FieldValue::DocumentType(DocumentType::Unknown)),
                ("Message", FieldValue::Message(message)),
            ],
        }
    }
}

impl Serialize for DocumentOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_entries(&self.entries(), serializer)
    }
}

fn serialize_entries<S: Serializer>(
    entries: &[(&'static str, FieldValue<'_>)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in entries {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

/// Everything the pipeline reports for one document.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    /// Raw recognized text, pages concatenated in order.
    pub extracted_text: String,

    /// Classification and field extraction outcome.
    pub outcome: DocumentOutcome,

    /// Wall-clock time spent in extraction, classification and validation.
    pub elapsed: Duration,
}

impl ProcessedDocument {
    /// Elapsed time in seconds, rounded to two decimals.
    pub fn elapsed_seconds(&self) -> f64 {
        (self.elapsed.as_secs_f64() * 100.0).round() / 100.0
    }
}

impl Serialize for ProcessedDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProcessedDocument", 3)?;
        state.serialize_field("extracted_text", &self.extracted_text)?;
        state.serialize_field("results", &self.outcome)?;
        state.serialize_field("elapsed_seconds", &self.elapsed_seconds())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_type_labels() {
        assert_eq!(DocumentType::PanCard.to_string(), "PAN Card");
        assert_eq!(DocumentType::AadharCard.label(), "Aadhar Card");
        assert_eq!(
            serde_json::to_string(&DocumentType::Unknown).unwrap(),
            "\"Unknown Document\""
        );
        let parsed: DocumentType = serde_json::from_str("\"Invoice\"").unwrap();
        assert_eq!(parsed, DocumentType::Invoice);
        assert_eq!(DocumentType::from_label("Aadhar Card"), Some(DocumentType::AadharCard));
        assert_eq!(DocumentType::from_label("aadhar card"), None);
    }

    #[test]
    fn test_fields_agree_with_type() {
        assert_eq!(
            DocumentFields::PanCard { pan: vec![] }.document_type(),
            DocumentType::PanCard
        );
        assert_eq!(
            DocumentFields::Contract { dates: vec![] }.document_type(),
            DocumentType::Contract
        );
        assert_eq!(DocumentFields::Unknown.document_type(), DocumentType::Unknown);
        assert!(DocumentFields::Unknown.entries().is_empty());
    }

    #[test]
    fn test_result_serializes_in_display_order() {
        let result = ValidationResult {
            document_type: DocumentType::Invoice,
            fields: DocumentFields::Invoice {
                invoice_numbers: vec!["INV123".to_string()],
                amounts: vec![],
            },
            emails: vec!["a@b.com".to_string()],
            phone_numbers: vec![],
        };

        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"Document Type":"Invoice","Invoice No":["INV123"],"Amount":[],"Emails":["a@b.com"],"Phone Numbers":[]}"#
        );
        assert_eq!(result.get("Amount"), Some(FieldValue::Matches(&[])));
        assert_eq!(result.get("PAN"), None);
    }

    #[test]
    fn test_no_text_sentinel_rendering() {
        let outcome = DocumentOutcome::no_text();
        assert!(outcome.is_no_text());
        assert_eq!(outcome.document_type(), DocumentType::Unknown);
        assert!(outcome.validation().is_none());
        assert_eq!(
            serde_json::to_string(&outcome).unwrap(),
            r#"{"Document Type":"Unknown Document","Message":"No recognizable text was detected."}"#
        );
    }

    #[test]
    fn test_elapsed_seconds_rounding() {
        let doc = ProcessedDocument {
            extracted_text: String::new(),
            outcome: DocumentOutcome::no_text(),
            elapsed: Duration::from_millis(1237),
        };
        assert_eq!(doc.elapsed_seconds(), 1.24);
    }
}
