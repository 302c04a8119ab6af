//! Local heuristic analysis used when no provider credential is available.

use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};

use crate::invoice::rules::{extract_document_number, extract_first_date, extract_total};
use crate::invoice::{normalize_whitespace, InvoiceClassifier};
use crate::models::invoice::InvoiceRecord;

/// Provider name reported for locally produced records.
pub const MOCK_PROVIDER: &str = "mock";

/// Model name reported for locally produced records.
pub const MOCK_MODEL: &str = "local-heuristic";

const PREVIEW_WORDS: usize = 40;

/// Build an invoice record from rule-based extraction alone.
pub fn analyze_locally(text: &str, note: &str) -> InvoiceRecord {
    let normalized = normalize_whitespace(text);
    let classification = InvoiceClassifier::new().classify(&normalized);
    let total = extract_total(&normalized);

    InvoiceRecord {
        is_invoice: json!(classification.is_valid),
        document_type: json!(if classification.is_valid { "invoice" } else { "unknown" }),
        invoice_number: optional(extract_document_number(&normalized)),
        invoice_date: optional(extract_first_date(&normalized)),
        currency: optional(total.as_ref().and_then(|t| t.currency.clone())),
        total_amount: total
            .and_then(|t| t.amount.to_f64())
            .map(|amount| json!(amount))
            .unwrap_or(Value::Null),
        confidence: json!(f64::from(classification.score) / 4.0),
        note: Some(note.to_string()),
        preview: Some(preview(&normalized)),
        ..Default::default()
    }
}

/// First words of the document.
pub fn preview(text: &str) -> String {
    text.split_whitespace()
        .take(PREVIEW_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

fn optional(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}
