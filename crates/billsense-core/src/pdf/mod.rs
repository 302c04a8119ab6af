//! PDF text extraction collaborator.
//!
//! Turns raw document bytes into plain text for the classifier. Every failure
//! is an input format error.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;
}

/// Extract readable text from PDF bytes.
///
/// Fails when the document cannot be parsed, has no pages, or yields no
/// text after trimming.
pub fn extract_pdf_text(data: &[u8]) -> Result<String> {
    let mut extractor = PdfExtractor::new();
    extractor.load(data)?;
    extractor.readable_text()
}
