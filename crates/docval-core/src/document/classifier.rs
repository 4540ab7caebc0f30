//! Keyword-based document classification.

use tracing::debug;

use crate::models::document::DocumentType;

/// A keyword group: any keyword found in the lower-cased text selects the type.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub keywords: &'static [&'static str],
    pub document_type: DocumentType,
}

impl ClassificationRule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

/// Rules in priority order. The first matching rule wins, so a contract that
/// mentions a certificate classifies as a certificate.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        keywords: &["income tax", "pan"],
        document_type: DocumentType::PanCard,
    },
    ClassificationRule {
        keywords: &["invoice"],
        document_type: DocumentType::Invoice,
    },
    ClassificationRule {
        keywords: &["certificate"],
        document_type: DocumentType::Certificate,
    },
    ClassificationRule {
        keywords: &["contract", "agreement"],
        document_type: DocumentType::Contract,
    },
    ClassificationRule {
        keywords: &["aadhar", "uidai"],
        document_type: DocumentType::AadharCard,
    },
];

/// Assign a document type to extracted text.
///
/// Plain substring containment on the lower-cased text, no word boundaries:
/// "company" contains "pan" and classifies as a PAN card.
pub fn classify(text: &str) -> DocumentType {
    let lowered = text.to_lowercase();

    let document_type = CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.document_type)
        .unwrap_or(DocumentType::Unknown);

    debug!("Classified {} characters as {}", text.len(), document_type);
    document_type
}
