//! Configuration structures for the billsense pipeline.

use serde::{Deserialize, Serialize};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Default provider base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Main configuration for the billsense pipeline.
///
/// Read once at startup and treated as immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillsenseConfig {
    /// AI provider configuration.
    pub ai: AiConfig,

    /// Result normalization configuration.
    pub extraction: ExtractionConfig,
}

/// Which provider API surface to call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiSurface {
    /// Modern responses endpoint with structured output support.
    #[default]
    Responses,
    /// Legacy chat completions endpoint, for providers without `/responses`.
    ///
    /// Chosen explicitly; the client does not probe the provider for a
    /// missing responses endpoint.
    ChatCompletions,
}

/// AI provider configuration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Provider credential. Only read from the environment, never from or to
    /// the config file.
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Model identifier.
    pub model: String,

    /// Produce a local heuristic result when no credential is configured.
    pub allow_mock_fallback: bool,

    /// Provider base URL (OpenAI-compatible).
    pub base_url: String,

    /// API surface to use.
    pub api_surface: ApiSurface,

    /// Upper bound for each network attempt, in seconds.
    pub request_timeout_secs: u64,

    /// Document text is truncated to this many characters before sending.
    pub max_input_chars: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            allow_mock_fallback: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_surface: ApiSurface::Responses,
            request_timeout_secs: 60,
            max_input_chars: 12_000,
        }
    }
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("allow_mock_fallback", &self.allow_mock_fallback)
            .field("base_url", &self.base_url)
            .field("api_surface", &self.api_surface)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_input_chars", &self.max_input_chars)
            .finish()
    }
}

impl AiConfig {
    /// The configured credential, treating an empty string as absent.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

/// Result normalization configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Null out provider values whose JSON type does not match the schema
    /// instead of passing them through.
    pub strict_types: bool,
}

impl BillsenseConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Recognized variables: `OPENAI_API_KEY`, `OPENAI_MODEL`,
    /// `OPENAI_BASE_URL` and `USE_MOCK_AI_FALLBACK` (`"1"` enables).
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.ai.api_key = Some(key);
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|m| !m.trim().is_empty()) {
            self.ai.model = model;
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.ai.base_url = url;
        }
        if let Some(flag) = lookup("USE_MOCK_AI_FALLBACK") {
            self.ai.allow_mock_fallback = flag.trim() == "1";
        }
        self
    }

    /// Apply overrides from the process environment.
    pub fn with_process_env(self) -> Self {
        self.with_env_overrides(|name| std::env::var(name).ok())
    }
}
