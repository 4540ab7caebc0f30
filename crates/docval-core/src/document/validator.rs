//! Type-specific field extraction.

use tracing::debug;

use crate::models::document::{DocumentFields, DocumentType, ValidationResult};

use super::patterns::{
    capture_all, find_all, AADHAR_NUMBER, AMOUNT, DATE_DMY, EMAIL, INVOICE_NUMBER, ISSUED_TO, PAN,
    PHONE,
};

/// Extract the fields for `document_type` plus emails and phone numbers.
///
/// The result always carries the document type it was given; the validator
/// never second-guesses the classifier.
pub fn validate(text: &str, document_type: DocumentType) -> ValidationResult {
    let fields = extract_fields(text, document_type);

    let result = ValidationResult {
        document_type,
        fields,
        emails: find_all(&EMAIL, text),
        phone_numbers: find_all(&PHONE, text),
    };

    debug!(
        "Validated {}: {} emails, {} phone numbers",
        document_type,
        result.emails.len(),
        result.phone_numbers.len()
    );

    result
}

fn extract_fields(text: &str, document_type: DocumentType) -> DocumentFields {
    match document_type {
        DocumentType::PanCard => DocumentFields::PanCard {
            pan: find_all(&PAN, text),
        },
        DocumentType::Invoice => DocumentFields::Invoice {
            invoice_numbers: find_all(&INVOICE_NUMBER, text),
            amounts: find_all(&AMOUNT, text),
        },
        DocumentType::Certificate => DocumentFields::Certificate {
            issued_to: capture_all(&ISSUED_TO, text),
        },
        DocumentType::Contract => DocumentFields::Contract {
            dates: find_all(&DATE_DMY, text),
        },
        DocumentType::AadharCard => DocumentFields::AadharCard {
            aadhar_numbers: find_all(&AADHAR_NUMBER, text),
        },
        DocumentType::Unknown => DocumentFields::Unknown,
    }
}
