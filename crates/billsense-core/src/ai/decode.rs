//! Turning provider responses into a JSON object.

use serde_json::{Map, Value};

use crate::error::{snippet, ExtractionError};

/// Textual payload of a responses-API reply.
///
/// Uses the consolidated `output_text` when present, otherwise joins every
/// text fragment of every output segment in order.
pub fn responses_output_text(response: &Value) -> String {
    if let Some(text) = response.get("output_text").and_then(Value::as_str) {
        if !text.is_empty() {
            return text.to_string();
        }
    }

    let parts: Vec<&str> = response
        .get("output")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter_map(|content| content.get("text").and_then(Value::as_str))
        .filter(|text| !text.is_empty())
        .collect();

    parts.join("\n").trim().to_string()
}

/// Message content of the first choice of a chat completion.
pub fn chat_completion_text(response: &Value) -> String {
    response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Remove a leading ```` ```json ```` / ```` ``` ```` marker and a trailing
/// ```` ``` ```` marker.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```JSON"))
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Parse a provider payload into a JSON object.
pub fn parse_payload(raw: &str) -> Result<Map<String, Value>, ExtractionError> {
    if raw.trim().is_empty() {
        return Err(ExtractionError::ResponseFormat(
            "AI returned an empty response.".to_string(),
        ));
    }

    let cleaned = strip_code_fence(raw);
    let parsed: Value = serde_json::from_str(cleaned).map_err(|_| {
        ExtractionError::ResponseFormat(format!("AI returned invalid JSON: {}", snippet(cleaned)))
    })?;

    match parsed {
        Value::Object(map) => Ok(map),
        _ => Err(ExtractionError::ResponseFormat(format!(
            "AI JSON response must be an object: {}",
            snippet(cleaned)
        ))),
    }
}
