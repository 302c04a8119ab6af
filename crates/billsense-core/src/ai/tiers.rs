//! Invocation tiers: the ordered ways of asking the provider for an invoice
//! record.

use serde_json::{json, Value};

use super::decode::{chat_completion_text, responses_output_text};
use super::schema::{
    invoice_json_schema, legacy_system_prompt, required_keys_instruction, user_message,
    LEGACY_USER_PROMPT, SCHEMA_NAME, SYSTEM_PROMPT,
};
use super::transport::{ProviderFailure, Transport};

/// `api_mode` reported when the legacy surface served a request.
pub const LEGACY_API_MODE: &str = "chat_completions_fallback";

/// What every tier sends: the model and the already truncated document text.
#[derive(Debug, Clone, Copy)]
pub struct TierRequest<'a> {
    pub model: &'a str,
    pub text: &'a str,
}

/// One way of calling the provider.
pub trait InvocationTier: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Path of the endpoint, relative to the provider base URL.
    fn endpoint(&self) -> &'static str;

    /// `api_mode` to report when this tier produced the result.
    fn api_mode(&self) -> Option<&'static str> {
        None
    }

    /// Request body for this tier.
    fn build_request(&self, request: &TierRequest<'_>) -> Value;

    /// Textual payload of a successful response.
    fn payload_text(&self, response: &Value) -> String;

    /// Perform one network call and return the raw textual payload.
    fn attempt(
        &self,
        transport: &dyn Transport,
        request: &TierRequest<'_>,
    ) -> Result<String, ProviderFailure> {
        let body = self.build_request(request);
        let response = transport.post_json(self.endpoint(), &body)?;
        Ok(self.payload_text(&response))
    }
}

fn input_text_message(role: &str, text: &str) -> Value {
    json!({
        "role": role,
        "content": [{"type": "input_text", "text": text}],
    })
}

fn responses_input(text: &str) -> Vec<Value> {
    vec![
        input_text_message("system", SYSTEM_PROMPT),
        input_text_message("user", &user_message(text)),
    ]
}

/// Responses API with a strict JSON schema.
pub struct StructuredTier;

impl InvocationTier for StructuredTier {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn endpoint(&self) -> &'static str {
        "responses"
    }

    fn build_request(&self, request: &TierRequest<'_>) -> Value {
        json!({
            "model": request.model,
            "input": responses_input(request.text),
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": SCHEMA_NAME,
                    "strict": true,
                    "schema": invoice_json_schema(),
                }
            },
        })
    }

    fn payload_text(&self, response: &Value) -> String {
        responses_output_text(response)
    }
}

/// Responses API in plain JSON mode, for models that reject strict schemas.
pub struct PermissiveTier;

impl InvocationTier for PermissiveTier {
    fn name(&self) -> &'static str {
        "permissive"
    }

    fn endpoint(&self) -> &'static str {
        "responses"
    }

    fn build_request(&self, request: &TierRequest<'_>) -> Value {
        let mut input = responses_input(request.text);
        input.push(input_text_message("developer", &required_keys_instruction()));

        json!({
            "model": request.model,
            "input": input,
            "text": {"format": {"type": "json_object"}},
        })
    }

    fn payload_text(&self, response: &Value) -> String {
        responses_output_text(response)
    }
}

/// Chat completions API, for providers without the responses endpoint.
pub struct LegacyTier;

impl InvocationTier for LegacyTier {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn endpoint(&self) -> &'static str {
        "chat/completions"
    }

    fn api_mode(&self) -> Option<&'static str> {
        Some(LEGACY_API_MODE)
    }

    fn build_request(&self, request: &TierRequest<'_>) -> Value {
        json!({
            "model": request.model,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": legacy_system_prompt()},
                {"role": "user", "content": format!("{LEGACY_USER_PROMPT}\n\n{}", request.text)},
            ],
        })
    }

    fn payload_text(&self, response: &Value) -> String {
        chat_completion_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REQUEST: TierRequest<'static> = TierRequest {
        model: "gpt-4.1-mini",
        text: "Invoice #1",
    };

    #[test]
    fn test_structured_request() {
        let body = StructuredTier.build_request(&REQUEST);
        assert_eq!(body["model"], "gpt-4.1-mini");
        assert_eq!(body["text"]["format"]["type"], "json_schema");
        assert_eq!(body["text"]["format"]["name"], "invoice_analysis");
        assert_eq!(body["text"]["format"]["strict"], true);
        assert_eq!(body["input"].as_array().unwrap().len(), 2);
        assert_eq!(
            body["input"][1]["content"][0]["text"],
            "Analyze this invoice-like document text and extract fields.\n\nInvoice #1"
        );
    }

    #[test]
    fn test_permissive_request_adds_key_instruction() {
        let body = PermissiveTier.build_request(&REQUEST);
        assert_eq!(body["text"]["format"], json!({"type": "json_object"}));
        let input = body["input"].as_array().unwrap();
        assert_eq!(input.len(), 3);
        assert_eq!(input[2]["role"], "developer");
        assert!(input[2]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("line_items, confidence"));
    }

    #[test]
    fn test_legacy_request() {
        let body = LegacyTier.build_request(&REQUEST);
        assert_eq!(LegacyTier.endpoint(), "chat/completions");
        assert_eq!(LegacyTier.api_mode(), Some("chat_completions_fallback"));
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(
            body["messages"][1]["content"],
            "Analyze this invoice-like document text and extract fields:\n\nInvoice #1"
        );
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .starts_with("You extract invoice data from OCR text and return a JSON object."));
        assert_eq!(StructuredTier.api_mode(), None);
        assert_eq!(PermissiveTier.api_mode(), None);
    }
}
