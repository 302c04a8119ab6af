//! AI extraction orchestrator.
//!
//! Picks the invocation tiers for the configured API surface, walks them in
//! order, and turns the first successful answer into an [`ExtractionEnvelope`].
//! The only failure that moves on to the next tier is a malformed-request
//! rejection; everything else is surfaced to the caller as a typed error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::coerce::SchemaCoercer;
use super::decode::parse_payload;
use super::mock::{analyze_locally, MOCK_MODEL, MOCK_PROVIDER};
use super::schema::truncate_chars;
use super::tiers::{InvocationTier, LegacyTier, PermissiveTier, StructuredTier, TierRequest};
use super::transport::{HttpTransport, Transport};
use crate::error::ExtractionError;
use crate::models::config::{AiConfig, ApiSurface};
use crate::models::invoice::{EnvelopeStatus, ExtractionEnvelope};

/// Provider name reported in envelopes.
pub const PROVIDER_NAME: &str = "openai";

const MISSING_CREDENTIAL: &str = "OPENAI_API_KEY is not set.";
const MOCK_NOTE: &str = "OPENAI_API_KEY is not set, fallback to mock mode.";

/// Runs AI extraction against the configured provider.
///
/// `extract` blocks on network I/O; run it on a worker thread.
pub struct ExtractionOrchestrator {
    config: AiConfig,
    transport: Option<Arc<dyn Transport>>,
    tiers: Vec<Box<dyn InvocationTier>>,
    coercer: SchemaCoercer,
}

impl ExtractionOrchestrator {
    /// Create an orchestrator that talks HTTP to `config.base_url`.
    ///
    /// No client is built when no credential is configured.
    pub fn new(config: AiConfig) -> Result<Self, ExtractionError> {
        let transport: Option<Arc<dyn Transport>> = match config.credential() {
            Some(key) => Some(Arc::new(HttpTransport::new(
                &config.base_url,
                key,
                Duration::from_secs(config.request_timeout_secs),
            )?)),
            None => None,
        };
        Ok(Self::build(config, transport))
    }

    /// Create an orchestrator with a custom transport.
    pub fn with_transport(config: AiConfig, transport: Arc<dyn Transport>) -> Self {
        Self::build(config, Some(transport))
    }

    fn build(config: AiConfig, transport: Option<Arc<dyn Transport>>) -> Self {
        let tiers = tiers_for(config.api_surface);
        Self {
            config,
            transport,
            tiers,
            coercer: SchemaCoercer::new(),
        }
    }

    /// Use a different coercer (e.g. strict type checking).
    pub fn with_coercer(mut self, coercer: SchemaCoercer) -> Self {
        self.coercer = coercer;
        self
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Names of the tiers that will be attempted, in order.
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|tier| tier.name()).collect()
    }

    /// Extract invoice fields from document text.
    pub fn extract(&self, text: &str) -> Result<ExtractionEnvelope, ExtractionError> {
        if self.config.credential().is_none() {
            return self.without_credential(text);
        }
        let transport = self.transport.as_deref().ok_or_else(|| {
            ExtractionError::Config("no provider transport configured".to_string())
        })?;

        let request = TierRequest {
            model: &self.config.model,
            text: truncate_chars(text, self.config.max_input_chars),
        };
        debug!(
            "Sending {} of {} characters to the provider",
            request.text.chars().count(),
            text.chars().count()
        );

        let mut tiers = self.tiers.iter().peekable();
        while let Some(tier) = tiers.next() {
            let start = Instant::now();
            info!(tier = tier.name(), model = %self.config.model, "Calling AI provider");

            match tier.attempt(transport, &request) {
                Ok(raw) => {
                    debug!(
                        "Tier {} answered with {} bytes in {:?}",
                        tier.name(),
                        raw.len(),
                        start.elapsed()
                    );
                    let data = parse_payload(&raw)?;
                    return Ok(ExtractionEnvelope {
                        status: EnvelopeStatus::Ok,
                        provider: PROVIDER_NAME.to_string(),
                        model: self.config.model.clone(),
                        api_mode: tier.api_mode().map(str::to_string),
                        result: self.coercer.coerce(&data),
                    });
                }
                Err(failure) if failure.is_malformed_request() && tiers.peek().is_some() => {
                    warn!(
                        tier = tier.name(),
                        "Provider rejected the request format, retrying with a relaxed format: {}",
                        failure
                    );
                }
                Err(failure) => {
                    warn!(tier = tier.name(), "AI provider call failed: {}", failure);
                    return Err(failure.into());
                }
            }
        }

        Err(ExtractionError::Config(
            "no invocation tier configured".to_string(),
        ))
    }

    fn without_credential(&self, text: &str) -> Result<ExtractionEnvelope, ExtractionError> {
        if !self.config.allow_mock_fallback {
            return Err(ExtractionError::Config(MISSING_CREDENTIAL.to_string()));
        }

        warn!("No provider credential configured, using local mock analysis");
        Ok(ExtractionEnvelope {
            status: EnvelopeStatus::Mocked,
            provider: MOCK_PROVIDER.to_string(),
            model: MOCK_MODEL.to_string(),
            api_mode: None,
            result: analyze_locally(text, MOCK_NOTE),
        })
    }
}

/// Ordered tiers for an API surface.
fn tiers_for(surface: ApiSurface) -> Vec<Box<dyn InvocationTier>> {
    match surface {
        ApiSurface::Responses => vec![Box::new(StructuredTier), Box::new(PermissiveTier)],
        ApiSurface::ChatCompletions => vec![Box::new(LegacyTier)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::transport::ProviderFailure;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport returning scripted replies and recording every call.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<Value, ProviderFailure>>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<Value, ProviderFailure>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn post_json(&self, path: &str, body: &Value) -> Result<Value, ProviderFailure> {
            self.calls.lock().unwrap().push((path.to_string(), body.clone()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderFailure::Connection("no scripted reply".into())))
        }
    }

    fn config_with_key() -> AiConfig {
        AiConfig {
            api_key: Some("sk-test".to_string()),
            ..AiConfig::default()
        }
    }

    fn responses_reply(text: &str) -> Result<Value, ProviderFailure> {
        Ok(json!({"output_text": text}))
    }

    fn orchestrator(config: AiConfig, transport: &Arc<ScriptedTransport>) -> ExtractionOrchestrator {
        ExtractionOrchestrator::with_transport(config, transport.clone())
    }

    const INVOICE_TEXT: &str = "Invoice #INV-2026-001 Date: 2026-02-10 Total: 1999.99 USD";

    #[test]
    fn test_mock_without_credential() {
        let transport = ScriptedTransport::new(vec![]);
        let envelope = orchestrator(AiConfig::default(), &transport)
            .extract(INVOICE_TEXT)
            .unwrap();

        assert_eq!(envelope.status, EnvelopeStatus::Mocked);
        assert_eq!(envelope.provider, "mock");
        assert_eq!(envelope.api_mode, None);
        assert!(envelope.result.note.is_some());
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_mock_without_any_transport() {
        let envelope = ExtractionOrchestrator::new(AiConfig::default())
            .unwrap()
            .extract("")
            .unwrap();
        assert_eq!(envelope.status, EnvelopeStatus::Mocked);
        assert_eq!(envelope.result.is_invoice, json!(false));
    }

    #[test]
    fn test_missing_credential_without_fallback() {
        let transport = ScriptedTransport::new(vec![]);
        let config = AiConfig {
            allow_mock_fallback: false,
            ..AiConfig::default()
        };
        let error = orchestrator(config, &transport).extract(INVOICE_TEXT).unwrap_err();

        assert_eq!(error, ExtractionError::Config("OPENAI_API_KEY is not set.".into()));
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_structured_success() {
        let transport = ScriptedTransport::new(vec![responses_reply(
            r#"{"is_invoice": true, "invoice_number": "INV-2026-001", "total_amount": 1999.99, "chatter": "hi"}"#,
        )]);
        let envelope = orchestrator(config_with_key(), &transport)
            .extract(INVOICE_TEXT)
            .unwrap();

        assert_eq!(envelope.status, EnvelopeStatus::Ok);
        assert_eq!(envelope.provider, "openai");
        assert_eq!(envelope.model, "gpt-4.1-mini");
        assert_eq!(envelope.api_mode, None);
        assert_eq!(envelope.result.invoice_number, json!("INV-2026-001"));
        assert_eq!(envelope.result.total_amount, json!(1999.99));
        assert_eq!(envelope.result.document_type, json!("unknown"));

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "responses");
        assert_eq!(calls[0].1["text"]["format"]["type"], "json_schema");
    }

    #[test]
    fn test_malformed_request_falls_back_once() {
        let transport = ScriptedTransport::new(vec![
            Err(ProviderFailure::MalformedRequest("schema not supported".into())),
            responses_reply(r#"{"is_invoice": true}"#),
        ]);
        let envelope = orchestrator(config_with_key(), &transport)
            .extract(INVOICE_TEXT)
            .unwrap();

        assert_eq!(envelope.result.is_invoice, json!(true));
        assert_eq!(envelope.api_mode, None);
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1["text"]["format"]["type"], "json_object");
        assert_eq!(calls[1].1["input"][2]["role"], "developer");
    }

    #[test]
    fn test_never_a_third_attempt() {
        let transport = ScriptedTransport::new(vec![
            Err(ProviderFailure::MalformedRequest("first".into())),
            Err(ProviderFailure::MalformedRequest("second".into())),
            responses_reply("{}"),
        ]);
        let error = orchestrator(config_with_key(), &transport)
            .extract(INVOICE_TEXT)
            .unwrap_err();

        assert_eq!(
            error,
            ExtractionError::Status {
                status: 400,
                message: "second".into()
            }
        );
        assert_eq!(error.kind(), ErrorKind::TransientProvider);
        assert_eq!(transport.calls().len(), 2);
    }

    #[test]
    fn test_authentication_failure_is_config_error() {
        let transport = ScriptedTransport::new(vec![Err(ProviderFailure::Authentication(
            "Incorrect API key".into(),
        ))]);
        let error = orchestrator(config_with_key(), &transport)
            .extract(INVOICE_TEXT)
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(!error.is_retryable());
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn test_transient_failures_not_retried() {
        let failures = [
            ProviderFailure::RateLimited("slow down".into()),
            ProviderFailure::Connection("refused".into()),
            ProviderFailure::Timeout("60s".into()),
            ProviderFailure::Status {
                status: 500,
                message: "oops".into(),
            },
        ];
        for failure in failures {
            let transport = ScriptedTransport::new(vec![Err(failure.clone()), responses_reply("{}")]);
            let error = orchestrator(config_with_key(), &transport)
                .extract(INVOICE_TEXT)
                .unwrap_err();

            assert_eq!(error.kind(), ErrorKind::TransientProvider, "{failure:?}");
            assert!(error.is_retryable());
            assert_eq!(transport.calls().len(), 1, "{failure:?}");
        }
    }

    #[test]
    fn test_fenced_payload() {
        let transport = ScriptedTransport::new(vec![responses_reply(
            "```json\n{\"vendor_name\": \"Acme\", \"line_items\": [{\"description\": \"Widget\"}]}\n```",
        )]);
        let envelope = orchestrator(config_with_key(), &transport)
            .extract(INVOICE_TEXT)
            .unwrap();

        assert_eq!(envelope.result.vendor_name, json!("Acme"));
        assert_eq!(envelope.result.line_items, json!([{"description": "Widget"}]));
    }

    #[test]
    fn test_invalid_json_is_response_format_error_without_fallback() {
        let transport = ScriptedTransport::new(vec![responses_reply("Sorry, I cannot help.")]);
        let error = orchestrator(config_with_key(), &transport)
            .extract(INVOICE_TEXT)
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ResponseFormat);
        assert!(error.to_string().contains("Sorry, I cannot help."));
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn test_empty_output_is_response_format_error() {
        let transport = ScriptedTransport::new(vec![Ok(json!({"output": []}))]);
        let error = orchestrator(config_with_key(), &transport)
            .extract(INVOICE_TEXT)
            .unwrap_err();
        assert_eq!(
            error,
            ExtractionError::ResponseFormat("AI returned an empty response.".into())
        );
    }

    #[test]
    fn test_legacy_surface() {
        let transport = ScriptedTransport::new(vec![Ok(json!({
            "choices": [{"message": {"content": "{\"is_invoice\": true, \"currency\": \"EUR\"}"}}]
        }))]);
        let config = AiConfig {
            api_surface: ApiSurface::ChatCompletions,
            model: "gpt-4o-mini".to_string(),
            ..config_with_key()
        };
        let envelope = orchestrator(config, &transport).extract(INVOICE_TEXT).unwrap();

        assert_eq!(envelope.status, EnvelopeStatus::Ok);
        assert_eq!(envelope.model, "gpt-4o-mini");
        assert_eq!(envelope.api_mode.as_deref(), Some("chat_completions_fallback"));
        assert_eq!(envelope.result.currency, json!("EUR"));
        assert_eq!(transport.calls()[0].0, "chat/completions");
    }

    #[test]
    fn test_legacy_malformed_request_not_retried() {
        let transport = ScriptedTransport::new(vec![
            Err(ProviderFailure::MalformedRequest("bad".into())),
            Ok(json!({})),
        ]);
        let config = AiConfig {
            api_surface: ApiSurface::ChatCompletions,
            ..config_with_key()
        };
        assert!(orchestrator(config, &transport).extract(INVOICE_TEXT).is_err());
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn test_legacy_empty_content() {
        let transport = ScriptedTransport::new(vec![Ok(json!({"choices": []}))]);
        let config = AiConfig {
            api_surface: ApiSurface::ChatCompletions,
            ..config_with_key()
        };
        let error = orchestrator(config, &transport).extract(INVOICE_TEXT).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ResponseFormat);
    }

    #[test]
    fn test_input_truncated() {
        let transport = ScriptedTransport::new(vec![responses_reply("{}")]);
        let config = AiConfig {
            max_input_chars: 7,
            ..config_with_key()
        };
        orchestrator(config, &transport).extract(INVOICE_TEXT).unwrap();

        let body = &transport.calls()[0].1;
        let user_text = body["input"][1]["content"][0]["text"].as_str().unwrap();
        assert!(user_text.ends_with("\n\nInvoice"));
    }

    #[test]
    fn test_strict_coercer() {
        let transport = ScriptedTransport::new(vec![responses_reply(r#"{"total_amount": "12"}"#)]);
        let envelope = orchestrator(config_with_key(), &transport)
            .with_coercer(SchemaCoercer::strict())
            .extract(INVOICE_TEXT)
            .unwrap();
        assert_eq!(envelope.result.total_amount, Value::Null);
    }

    #[test]
    fn test_tier_plans() {
        let transport = ScriptedTransport::new(vec![]);
        assert_eq!(
            orchestrator(config_with_key(), &transport).tier_names(),
            vec!["structured", "permissive"]
        );
        let config = AiConfig {
            api_surface: ApiSurface::ChatCompletions,
            ..config_with_key()
        };
        assert_eq!(orchestrator(config, &transport).tier_names(), vec!["legacy"]);
    }
}
