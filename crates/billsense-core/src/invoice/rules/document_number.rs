//! Invoice / bill number extraction.

use super::{ExtractionMatch, FieldExtractor};
use super::patterns::DOCUMENT_NUMBER;

/// Extractor for labeled document numbers ("Invoice #INV-1", "Bill no. 7").
pub struct DocumentNumberExtractor;

impl DocumentNumberExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocumentNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DocumentNumberExtractor {
    type Output = ExtractionMatch<String>;

    /// First token that contains a digit; plain words after "invoice" are
    /// usually prose, not numbers.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text)
            .into_iter()
            .find(|m| m.value.chars().any(|c| c.is_ascii_digit()))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        DOCUMENT_NUMBER
            .captures_iter(text)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                let token = caps[1].trim_matches(['-', '/']).to_string();
                Some(
                    ExtractionMatch::new(token, 0.85, full.as_str())
                        .with_position(full.start(), full.end()),
                )
            })
            .collect()
    }
}

/// Extract the most plausible invoice number from text.
pub fn extract_document_number(text: &str) -> Option<String> {
    DocumentNumberExtractor::new().extract(text).map(|m| m.value)
}
