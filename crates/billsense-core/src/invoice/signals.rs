//! Lexical and structural signal extraction.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::rules::patterns::{amount_patterns, date_patterns, DOCUMENT_NUMBER, INVOICE_KEYWORDS};

/// Signals found in a piece of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalBundle {
    /// Number of distinct invoice keywords present (each counts once).
    pub keyword_hit_count: u32,
    /// A total/amount label followed by a number.
    pub has_amount: bool,
    /// An invoice/bill label followed by an identifier.
    pub has_document_number: bool,
    /// A `dd.mm.yyyy` or `yyyy-mm-dd` style date.
    pub has_date: bool,
}

impl SignalBundle {
    /// Number of satisfied signal families (0..=4).
    pub fn score(&self) -> u8 {
        [
            self.keyword_hit_count >= 2,
            self.has_amount,
            self.has_document_number,
            self.has_date,
        ]
        .into_iter()
        .filter(|hit| *hit)
        .count() as u8
    }
}

/// Scans normalized text for invoice signals.
pub struct SignalExtractor;

impl SignalExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract signals from whitespace-normalized text.
    pub fn extract(&self, text: &str) -> SignalBundle {
        let lowered = text.to_lowercase();

        let keyword_hit_count = INVOICE_KEYWORDS
            .iter()
            .filter(|keyword| lowered.contains(**keyword))
            .count() as u32;

        let bundle = SignalBundle {
            keyword_hit_count,
            has_amount: amount_patterns().iter().any(|re| re.is_match(text)),
            has_document_number: DOCUMENT_NUMBER.is_match(text),
            has_date: date_patterns().iter().any(|re| re.is_match(text)),
        };

        trace!(?bundle, "Extracted signals");
        bundle
    }
}

impl Default for SignalExtractor {
    fn default() -> Self {
        Self::new()
    }
}
