//! Normalized invoice extraction schema and the response envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The fixed set of fields every invoice record carries, in schema order.
pub const INVOICE_FIELDS: [&str; 14] = [
    "is_invoice",
    "document_type",
    "invoice_number",
    "invoice_date",
    "due_date",
    "vendor_name",
    "customer_name",
    "currency",
    "total_amount",
    "subtotal_amount",
    "tax_amount",
    "payment_terms",
    "line_items",
    "confidence",
];

/// Nullable string fields.
pub const STRING_FIELDS: [&str; 7] = [
    "invoice_number",
    "invoice_date",
    "due_date",
    "vendor_name",
    "customer_name",
    "currency",
    "payment_terms",
];

/// Nullable number fields.
pub const NUMBER_FIELDS: [&str; 3] = ["total_amount", "subtotal_amount", "tax_amount"];

/// Invoice fields extracted from a document.
///
/// Values are kept as raw JSON so provider output can be passed through
/// without loss; use the typed accessors to read them. Producing a record with
/// exactly the fixed field set is the job of the schema coercer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceRecord {
    pub is_invoice: Value,
    pub document_type: Value,
    pub invoice_number: Value,
    pub invoice_date: Value,
    pub due_date: Value,
    pub vendor_name: Value,
    pub customer_name: Value,
    pub currency: Value,
    pub total_amount: Value,
    pub subtotal_amount: Value,
    pub tax_amount: Value,
    pub payment_terms: Value,
    pub line_items: Value,
    pub confidence: Value,

    /// Why the record was produced locally instead of by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Leading words of the document (local analysis only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl Default for InvoiceRecord {
    fn default() -> Self {
        Self {
            is_invoice: Value::Bool(false),
            document_type: Value::String("unknown".to_string()),
            invoice_number: Value::Null,
            invoice_date: Value::Null,
            due_date: Value::Null,
            vendor_name: Value::Null,
            customer_name: Value::Null,
            currency: Value::Null,
            total_amount: Value::Null,
            subtotal_amount: Value::Null,
            tax_amount: Value::Null,
            payment_terms: Value::Null,
            line_items: Value::Array(Vec::new()),
            confidence: json!(0.0),
            note: None,
            preview: None,
        }
    }
}

impl InvoiceRecord {
    /// Value of a schema field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        let value = match field {
            "is_invoice" => &self.is_invoice,
            "document_type" => &self.document_type,
            "invoice_number" => &self.invoice_number,
            "invoice_date" => &self.invoice_date,
            "due_date" => &self.due_date,
            "vendor_name" => &self.vendor_name,
            "customer_name" => &self.customer_name,
            "currency" => &self.currency,
            "total_amount" => &self.total_amount,
            "subtotal_amount" => &self.subtotal_amount,
            "tax_amount" => &self.tax_amount,
            "payment_terms" => &self.payment_terms,
            "line_items" => &self.line_items,
            "confidence" => &self.confidence,
            _ => return None,
        };
        Some(value)
    }

    /// Mutable value of a schema field by name.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        let value = match field {
            "is_invoice" => &mut self.is_invoice,
            "document_type" => &mut self.document_type,
            "invoice_number" => &mut self.invoice_number,
            "invoice_date" => &mut self.invoice_date,
            "due_date" => &mut self.due_date,
            "vendor_name" => &mut self.vendor_name,
            "customer_name" => &mut self.customer_name,
            "currency" => &mut self.currency,
            "total_amount" => &mut self.total_amount,
            "subtotal_amount" => &mut self.subtotal_amount,
            "tax_amount" => &mut self.tax_amount,
            "payment_terms" => &mut self.payment_terms,
            "line_items" => &mut self.line_items,
            "confidence" => &mut self.confidence,
            _ => return None,
        };
        Some(value)
    }

    /// The schema fields as a JSON object, without local annotations.
    pub fn to_map(&self) -> Map<String, Value> {
        INVOICE_FIELDS
            .iter()
            .filter_map(|field| self.get(field).map(|v| (field.to_string(), v.clone())))
            .collect()
    }

    pub fn is_invoice(&self) -> bool {
        self.is_invoice.as_bool().unwrap_or(false)
    }

    pub fn document_type(&self) -> &str {
        self.document_type.as_str().unwrap_or("unknown")
    }

    pub fn confidence(&self) -> f64 {
        self.confidence.as_f64().unwrap_or(0.0)
    }

    /// A nullable string field, `None` when null or not a string.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// A nullable number field, `None` when null or not a number.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    /// Line items that match the line item shape; others are skipped.
    pub fn typed_line_items(&self) -> Vec<LineItem> {
        self.line_items
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A single line on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item description.
    pub description: String,
    /// Quantity.
    #[serde(default)]
    pub quantity: Option<f64>,
    /// Price per unit.
    #[serde(default)]
    pub unit_price: Option<f64>,
    /// Line total.
    #[serde(default)]
    pub line_total: Option<f64>,
}

/// Whether the record came from the provider or from local analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Ok,
    Mocked,
}

/// Stable outer shape returned for every extraction, whichever tier answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionEnvelope {
    pub status: EnvelopeStatus,
    pub provider: String,
    pub model: String,
    /// Set only when a degraded API surface served the request.
    pub api_mode: Option<String>,
    pub result: InvoiceRecord,
}
