//! Request contract shared by every invocation tier: prompts and the strict
//! JSON schema for structured output.

use serde_json::{json, Value};

use crate::models::invoice::INVOICE_FIELDS;

/// Name of the structured output schema.
pub const SCHEMA_NAME: &str = "invoice_analysis";

pub const SYSTEM_PROMPT: &str = "You extract invoice data from OCR text. Return only valid JSON.";

pub const USER_PROMPT: &str = "Analyze this invoice-like document text and extract fields.";

/// User message lead-in on the chat completions surface.
pub const LEGACY_USER_PROMPT: &str = "Analyze this invoice-like document text and extract fields:";

/// JSON schema of the invoice record; every key required, no extras.
pub fn invoice_json_schema() -> Value {
    let nullable_string = json!({"type": ["string", "null"]});
    let nullable_number = json!({"type": ["number", "null"]});

    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "is_invoice": {"type": "boolean"},
            "document_type": {"type": "string"},
            "invoice_number": nullable_string,
            "invoice_date": nullable_string,
            "due_date": nullable_string,
            "vendor_name": nullable_string,
            "customer_name": nullable_string,
            "currency": nullable_string,
            "total_amount": nullable_number,
            "subtotal_amount": nullable_number,
            "tax_amount": nullable_number,
            "payment_terms": nullable_string,
            "line_items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "description": {"type": "string"},
                        "quantity": nullable_number,
                        "unit_price": nullable_number,
                        "line_total": nullable_number,
                    },
                    "required": ["description", "quantity", "unit_price", "line_total"],
                },
            },
            "confidence": {"type": "number"},
        },
        "required": INVOICE_FIELDS,
    })
}

/// Instruction listing the required keys, for tiers without schema enforcement.
pub fn required_keys_instruction() -> String {
    format!(
        "Return a single JSON object with keys: {}. Use null for unknown values.",
        INVOICE_FIELDS.join(", ")
    )
}

/// System prompt for the chat completions surface.
pub fn legacy_system_prompt() -> String {
    format!(
        "You extract invoice data from OCR text and return a JSON object. Required keys: {}. Use null for unknown values.",
        INVOICE_FIELDS.join(", ")
    )
}

/// User message carrying the document text.
pub fn user_message(text: &str) -> String {
    format!("{USER_PROMPT}\n\n{text}")
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
