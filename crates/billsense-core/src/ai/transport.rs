//! Provider transport: one JSON POST per call, with failures classified into
//! the categories the orchestrator branches on.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::{snippet, ExtractionError};

/// Classified failure of a single provider call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderFailure {
    /// The provider rejected the request shape (HTTP 400).
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The credential was rejected (HTTP 401).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Too many requests (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The attempt exceeded its time bound.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Any other non-success status.
    #[error("status {status}: {message}")]
    Status { status: u16, message: String },

    /// A success status with a body that is not JSON.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

impl ProviderFailure {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => Self::MalformedRequest(message),
            401 => Self::Authentication(message),
            429 => Self::RateLimited(message),
            _ => Self::Status { status, message },
        }
    }

    /// The only failure that lets the orchestrator try the next tier.
    pub fn is_malformed_request(&self) -> bool {
        matches!(self, Self::MalformedRequest(_))
    }
}

impl From<ProviderFailure> for ExtractionError {
    fn from(failure: ProviderFailure) -> Self {
        match failure {
            ProviderFailure::MalformedRequest(message) => Self::Status {
                status: 400,
                message,
            },
            ProviderFailure::Authentication(message) => Self::Authentication(message),
            ProviderFailure::RateLimited(message) => Self::RateLimited(message),
            ProviderFailure::Connection(message) => Self::Connection(message),
            ProviderFailure::Timeout(message) => Self::Timeout(message),
            ProviderFailure::Status { status, message } => Self::Status { status, message },
            ProviderFailure::InvalidBody(body) => {
                Self::ResponseFormat(format!("AI returned a non-JSON response body: {body}"))
            }
        }
    }
}

/// Sends JSON requests to the provider.
///
/// Implementations block the calling thread for the duration of the call.
pub trait Transport: Send + Sync {
    /// POST `body` to `path` (relative to the provider base URL) and return
    /// the decoded JSON response.
    fn post_json(&self, path: &str, body: &Value) -> Result<Value, ProviderFailure>;
}

/// Blocking HTTP transport for OpenAI-compatible APIs.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Create a transport; `timeout` bounds every request.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::from_client(client, base_url, api_key))
    }

    /// Create a transport around a preconfigured client.
    pub fn from_client(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, path: &str, body: &Value) -> Result<Value, ProviderFailure> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(classify_request_error)?;

        let status = response.status();
        let text = response.text().map_err(classify_request_error)?;
        debug!("Provider answered {} with {} bytes", status, text.len());

        if !status.is_success() {
            let mut message = error_message(&text);
            if message.is_empty() {
                message = status.canonical_reason().unwrap_or("unknown error").to_string();
            }
            return Err(ProviderFailure::from_status(status.as_u16(), message));
        }

        serde_json::from_str(&text).map_err(|_| ProviderFailure::InvalidBody(snippet(&text)))
    }
}

fn classify_request_error(error: reqwest::Error) -> ProviderFailure {
    if error.is_timeout() {
        ProviderFailure::Timeout(error.to_string())
    } else {
        ProviderFailure::Connection(error.to_string())
    }
}

/// `error.message` of an OpenAI-style error body, else a bounded raw snippet.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| snippet(body.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve exactly one canned HTTP response on a local port.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });

        format!("http://{addr}/v1")
    }

    fn read_request(stream: &mut std::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    fn transport_with_timeout(base_url: &str, timeout: Duration) -> HttpTransport {
        let client = Client::builder().no_proxy().timeout(timeout).build().unwrap();
        HttpTransport::from_client(client, base_url, "sk-test")
    }

    fn transport(base_url: &str) -> HttpTransport {
        transport_with_timeout(base_url, Duration::from_secs(5))
    }

    #[test]
    fn test_status_classification() {
        assert!(ProviderFailure::from_status(400, "bad".into()).is_malformed_request());
        assert_eq!(
            ProviderFailure::from_status(401, "no".into()),
            ProviderFailure::Authentication("no".into())
        );
        assert_eq!(
            ProviderFailure::from_status(429, "slow".into()),
            ProviderFailure::RateLimited("slow".into())
        );
        assert_eq!(
            ProviderFailure::from_status(503, "down".into()),
            ProviderFailure::Status { status: 503, message: "down".into() }
        );
    }

    #[test]
    fn test_terminal_malformed_request_is_status_error() {
        let error: ExtractionError = ProviderFailure::MalformedRequest("bad".into()).into();
        assert_eq!(error, ExtractionError::Status { status: 400, message: "bad".into() });
        assert!(error.is_retryable());
    }

    #[test]
    fn test_success_body_decoded() {
        let url = serve_once("200 OK", r#"{"output_text": "{}"}"#);
        let value = transport(&url).post_json("responses", &json!({})).unwrap();
        assert_eq!(value, json!({"output_text": "{}"}));
    }

    #[test]
    fn test_error_message_extracted() {
        let url = serve_once(
            "400 Bad Request",
            r#"{"error": {"message": "Invalid schema for response_format"}}"#,
        );
        let failure = transport(&url).post_json("responses", &json!({})).unwrap_err();
        assert_eq!(
            failure,
            ProviderFailure::MalformedRequest("Invalid schema for response_format".into())
        );
    }

    #[test]
    fn test_rate_limit_status() {
        let url = serve_once("429 Too Many Requests", "");
        let failure = transport(&url).post_json("responses", &json!({})).unwrap_err();
        assert_eq!(failure, ProviderFailure::RateLimited("Too Many Requests".into()));
    }

    #[test]
    fn test_non_json_success_body() {
        let url = serve_once("200 OK", "<html>gateway</html>");
        let failure = transport(&url).post_json("responses", &json!({})).unwrap_err();
        assert_eq!(failure, ProviderFailure::InvalidBody("<html>gateway</html>".into()));
    }

    #[test]
    fn test_connection_refused() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let failure = transport(&format!("http://{addr}/v1"))
            .post_json("responses", &json!({}))
            .unwrap_err();
        assert!(matches!(failure, ProviderFailure::Connection(_)), "{failure:?}");
    }

    #[test]
    fn test_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            thread::sleep(Duration::from_secs(3));
        });

        let transport =
            transport_with_timeout(&format!("http://{addr}/v1"), Duration::from_millis(300));
        let failure = transport.post_json("responses", &json!({})).unwrap_err();
        assert!(matches!(failure, ProviderFailure::Timeout(_)), "{failure:?}");
    }

    #[test]
    fn test_url_join() {
        let transport = transport("https://api.example.com/v1/");
        assert_eq!(transport.url("/responses"), "https://api.example.com/v1/responses");
        assert_eq!(transport.url("chat/completions"), "https://api.example.com/v1/chat/completions");
    }
}
