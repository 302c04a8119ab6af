//! Common regex patterns for invoice signal and field extraction.
//!
//! All patterns assume Western formats: decimal-point numerals and
//! `dd.mm.yyyy` / `yyyy-mm-dd` dates.

use lazy_static::lazy_static;
use regex::Regex;

/// Keywords whose presence hints at an invoice or bill.
pub const INVOICE_KEYWORDS: [&str; 6] = [
    "invoice",
    "bill",
    "receipt",
    "payment",
    "amount due",
    "total",
];

lazy_static! {
    // Amount patterns: label followed by a numeric literal
    pub static ref AMOUNT_TOTAL: Regex = Regex::new(
        r"(?i)\btotal\b\s*[:\-]?\s*\d[\d\s,.]*"
    ).unwrap();

    pub static ref AMOUNT_PLAIN: Regex = Regex::new(
        r"(?i)\bamount\b\s*[:\-]?\s*\d[\d\s,.]*"
    ).unwrap();

    pub static ref AMOUNT_DUE: Regex = Regex::new(
        r"(?i)\bamount due\b\s*[:\-]?\s*\d[\d\s,.]*"
    ).unwrap();

    // Document number: "Invoice #INV-1", "Bill no. 42", "InvoiceNo 7".
    // No boundary after the label, so "invoices" and "billing" match too.
    pub static ref DOCUMENT_NUMBER: Regex = Regex::new(
        r"(?i)\b(?:invoice|bill)\s*(?:(?:number|no)\.?|#)?\s*[:\-]?\s*([a-z0-9\-/]+)"
    ).unwrap();

    // Dates
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{2})[./\-](\d{2})[./\-](\d{4})\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{2})[./\-](\d{2})\b"
    ).unwrap();

    // Labeled totals with an optional trailing currency code
    pub static ref LABELED_TOTAL: Regex = Regex::new(
        r"(?i)\b(amount due|total)\b\s*[:\-]?\s*(\d(?:[\d,.\s]*\d)?)\s*(USD|EUR|GBP|PLN|CHF|CAD|AUD|JPY)?\b"
    ).unwrap();

    // Currency
    pub static ref CURRENCY_CODE: Regex = Regex::new(
        r"\b(USD|EUR|GBP|PLN|CHF|CAD|AUD|JPY)\b"
    ).unwrap();

    pub static ref CURRENCY_SYMBOL: Regex = Regex::new(
        r"[$€£]"
    ).unwrap();
}

/// Amount pattern family, most specific label last.
pub fn amount_patterns() -> [&'static Regex; 3] {
    [&*AMOUNT_TOTAL, &*AMOUNT_PLAIN, &*AMOUNT_DUE]
}

/// Date pattern family.
pub fn date_patterns() -> [&'static Regex; 2] {
    [&*DATE_DMY, &*DATE_YMD]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_requires_number() {
        assert!(AMOUNT_TOTAL.is_match("Total: 1,999.99 USD"));
        assert!(AMOUNT_TOTAL.is_match("TOTAL-250"));
        assert!(!AMOUNT_TOTAL.is_match("total cost of ownership"));
        assert!(AMOUNT_DUE.is_match("Amount due 42.00"));
        assert!(!AMOUNT_PLAIN.is_match("amounts: 12"));
    }

    #[test]
    fn test_document_number() {
        let caps = DOCUMENT_NUMBER.captures("Invoice #INV-2026-001").unwrap();
        assert_eq!(&caps[1], "INV-2026-001");

        let caps = DOCUMENT_NUMBER.captures("BILL No. 2024/17").unwrap();
        assert_eq!(&caps[1], "2024/17");

        let caps = DOCUMENT_NUMBER.captures("invoice number: A17").unwrap();
        assert_eq!(&caps[1], "A17");

        let caps = DOCUMENT_NUMBER.captures("InvoiceNo 55").unwrap();
        assert_eq!(&caps[1], "55");

        assert!(DOCUMENT_NUMBER.is_match("Invoices attached"));
        assert!(DOCUMENT_NUMBER.is_match("Billing statement"));
        assert!(!DOCUMENT_NUMBER.is_match("invoice"));
        assert!(!DOCUMENT_NUMBER.is_match("rebill 42"));
    }

    #[test]
    fn test_dates() {
        assert!(DATE_DMY.is_match("10.02.2026"));
        assert!(DATE_DMY.is_match("10/02/2026"));
        assert!(DATE_YMD.is_match("2026-02-10"));
        assert!(!DATE_DMY.is_match("2026-02-10"));
        assert!(!DATE_YMD.is_match("1.2.2026"));
    }

    #[test]
    fn test_labeled_total() {
        let caps = LABELED_TOTAL.captures("Total: 1,200.50 EUR").unwrap();
        assert_eq!(&caps[2], "1,200.50");
        assert_eq!(&caps[3], "EUR");

        let caps = LABELED_TOTAL.captures("Amount due - 99").unwrap();
        assert_eq!(&caps[1], "Amount due");
        assert_eq!(&caps[2], "99");
        assert!(caps.get(3).is_none());
    }
}
