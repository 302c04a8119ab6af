//! Schema coercion: map an arbitrary provider object onto the fixed
//! invoice record shape.

use serde_json::{Map, Value};

use crate::models::invoice::{InvoiceRecord, INVOICE_FIELDS, NUMBER_FIELDS, STRING_FIELDS};

/// How provider values of the wrong JSON type are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoercionMode {
    /// Keep every provided value verbatim.
    #[default]
    Lenient,
    /// Replace values of the wrong type with null (nullable fields) or the
    /// default (non-nullable fields).
    Strict,
}

/// Produces invoice records with exactly the fixed field set.
///
/// Missing fields get their defaults and unknown keys are dropped. Coercing a
/// coerced record again returns it unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaCoercer {
    mode: CoercionMode,
}

impl SchemaCoercer {
    /// Lenient coercer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Coercer that type-checks every field.
    pub fn strict() -> Self {
        Self {
            mode: CoercionMode::Strict,
        }
    }

    /// Coerce a decoded JSON object. Never fails.
    pub fn coerce(&self, data: &Map<String, Value>) -> InvoiceRecord {
        let mut record = InvoiceRecord::default();

        for field in INVOICE_FIELDS {
            let Some(value) = data.get(field) else {
                continue;
            };
            let value = match self.mode {
                CoercionMode::Lenient => Some(value.clone()),
                CoercionMode::Strict => checked_value(field, value),
            };
            if let (Some(value), Some(slot)) = (value, record.get_mut(field)) {
                *slot = value;
            }
        }

        record
    }
}

/// The value to store under strict coercion; `None` keeps the default.
fn checked_value(field: &str, value: &Value) -> Option<Value> {
    if STRING_FIELDS.contains(&field) {
        return Some(if value.is_string() { value.clone() } else { Value::Null });
    }
    if NUMBER_FIELDS.contains(&field) {
        return Some(nullable_number(value));
    }
    match field {
        "is_invoice" => value.is_boolean().then(|| value.clone()),
        "document_type" => value.is_string().then(|| value.clone()),
        "confidence" => value.is_number().then(|| value.clone()),
        "line_items" => value.as_array().map(|items| {
            Value::Array(items.iter().filter_map(checked_line_item).collect())
        }),
        _ => None,
    }
}

/// A line item keeps only its known keys; it is dropped without a string
/// description.
fn checked_line_item(item: &Value) -> Option<Value> {
    let item = item.as_object()?;
    let description = item.get("description").filter(|d| d.is_string())?;

    let mut checked = Map::new();
    checked.insert("description".to_string(), description.clone());
    for key in ["quantity", "unit_price", "line_total"] {
        let value = item.get(key).map(nullable_number).unwrap_or(Value::Null);
        checked.insert(key.to_string(), value);
    }
    Some(Value::Object(checked))
}

fn nullable_number(value: &Value) -> Value {
    if value.is_number() {
        value.clone()
    } else {
        Value::Null
    }
}
