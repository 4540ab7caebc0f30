//! Regex patterns for field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // PAN: 5 letters, 4 digits, 1 letter
    pub static ref PAN: Regex = Regex::new(r"[A-Z]{5}[0-9]{4}[A-Z]").unwrap();

    pub static ref INVOICE_NUMBER: Regex = Regex::new(r"INV[0-9]{3,}").unwrap();

    // Any run of 2+ digits with optional rupee sign and decimals
    pub static ref AMOUNT: Regex = Regex::new(r"₹?\d{2,}\.?\d*").unwrap();

    // Name is capture group 1; may span lines
    pub static ref ISSUED_TO: Regex = Regex::new(r"(?s)This is to certify that\s+(.*?)\s+has").unwrap();

    pub static ref DATE_DMY: Regex = Regex::new(r"\d{2}/\d{2}/\d{4}").unwrap();

    // Aadhar: three groups of 4 digits
    pub static ref AADHAR_NUMBER: Regex = Regex::new(r"\d{4}\s\d{4}\s\d{4}").unwrap();

    pub static ref EMAIL: Regex = Regex::new(r"[\w.-]+@[\w.-]+").unwrap();

    // Any 10-12 digit run, no numbering plan check
    pub static ref PHONE: Regex = Regex::new(r"\+?\d{10,12}").unwrap();
}

/// All non-overlapping matches, left to right.
pub fn find_all(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Capture group 1 of every non-overlapping match, left to right.
pub fn capture_all(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pan_pattern() {
        assert_eq!(find_all(&PAN, "PAN: ABCDE1234F"), vec!["ABCDE1234F"]);
        assert!(find_all(&PAN, "abcde1234f").is_empty());
        assert!(find_all(&PAN, "ABCD1234F").is_empty());
    }

    #[test]
    fn test_invoice_number_needs_three_digits() {
        assert_eq!(
            find_all(&INVOICE_NUMBER, "INV12 INV123 INV2024001"),
            vec!["INV123", "INV2024001"]
        );
    }

    #[test]
    fn test_amount_is_loose() {
        assert_eq!(
            find_all(&AMOUNT, "Total ₹1500.50, qty 7, ref 42"),
            vec!["₹1500.50", "42"]
        );
        assert_eq!(find_all(&AMOUNT, "99."), vec!["99."]);
    }

    #[test]
    fn test_issued_to_spans_lines() {
        let text = "This is to certify that\nJane\nRoe\nhas passed";
        assert_eq!(capture_all(&ISSUED_TO, text), vec!["Jane\nRoe"]);
    }

    #[test]
    fn test_issued_to_is_lazy() {
        let text = "This is to certify that Ann has won and she has left";
        assert_eq!(capture_all(&ISSUED_TO, text), vec!["Ann"]);
    }

    #[test]
    fn test_dates_and_aadhar() {
        assert_eq!(
            find_all(&DATE_DMY, "from 01/02/2024 to 1/2/2024"),
            vec!["01/02/2024"]
        );
        assert_eq!(
            find_all(&AADHAR_NUMBER, "1234 5678 9012 and 1234-5678-9012"),
            vec!["1234 5678 9012"]
        );
    }

    #[test]
    fn test_email_and_phone() {
        assert_eq!(
            find_all(&EMAIL, "mail john.doe@example.co.in or x-y@z"),
            vec!["john.doe@example.co.in", "x-y@z"]
        );
        assert_eq!(
            find_all(&PHONE, "+919876543210 and 98765 and 12345678901234"),
            vec!["+919876543210", "123456789012"]
        );
    }
}
