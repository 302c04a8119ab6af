//! Error types for the billsense-core library.

use thiserror::Error;

/// Maximum number of characters of provider output kept in error messages.
pub const DIAGNOSTIC_SNIPPET_CHARS: usize = 240;

/// Main error type for the billsense library.
#[derive(Error, Debug)]
pub enum BillsenseError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// AI extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// The input document could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input document is missing, empty or not text.
    #[error("{0}")]
    InvalidInput(String),
}

impl BillsenseError {
    /// Broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Pdf(_) | Self::Io(_) | Self::InvalidInput(_) => ErrorKind::InputFormat,
            Self::Extraction(e) => e.kind(),
        }
    }
}

/// Errors related to PDF text extraction.
///
/// Every variant is an input format error: the document cannot be used.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("unable to read PDF file: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF file has no pages")]
    NoPages,

    /// The PDF yielded no extractable text.
    #[error("PDF contains no readable text")]
    NoText,
}

/// Errors returned by the AI extraction orchestrator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Missing credential with fallback disabled, or other local misconfiguration.
    #[error("{0}")]
    Config(String),

    /// The provider rejected the credential.
    #[error("provider authentication failed: {0}")]
    Authentication(String),

    /// The provider is rate limiting requests.
    #[error("provider rate limit reached: {0}")]
    RateLimited(String),

    /// The provider could not be reached.
    #[error("provider connection error: {0}")]
    Connection(String),

    /// A network attempt exceeded the configured timeout.
    #[error("provider request timed out: {0}")]
    Timeout(String),

    /// Any other non-success status returned by the provider.
    #[error("provider API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The provider answered, but not with a usable JSON object.
    #[error("{0}")]
    ResponseFormat(String),
}

impl ExtractionError {
    /// Broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Authentication(_) => ErrorKind::Configuration,
            Self::RateLimited(_)
            | Self::Connection(_)
            | Self::Timeout(_)
            | Self::Status { .. } => ErrorKind::TransientProvider,
            Self::ResponseFormat(_) => ErrorKind::ResponseFormat,
        }
    }

    /// Whether a caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransientProvider
    }
}

/// Error taxonomy exposed to boundary layers.
///
/// `Configuration` and `InputFormat` are local failures; `TransientProvider`
/// and `ResponseFormat` originate upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unreadable or empty input document.
    InputFormat,
    /// Missing or rejected credential, bad local configuration.
    Configuration,
    /// Rate limiting, connectivity, timeout or provider-side status error.
    TransientProvider,
    /// Provider output was empty or not a JSON object.
    ResponseFormat,
}

/// Result type for the billsense library.
pub type Result<T> = std::result::Result<T, BillsenseError>;

/// Truncate `text` to at most [`DIAGNOSTIC_SNIPPET_CHARS`] characters.
pub(crate) fn snippet(text: &str) -> String {
    text.chars().take(DIAGNOSTIC_SNIPPET_CHARS).collect()
}
