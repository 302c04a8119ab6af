//! Heuristic invoice classifier.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::signals::{SignalBundle, SignalExtractor};

/// Number of signal families that must agree.
pub const MIN_SCORE: u8 = 3;

const ACCEPTED_REASON: &str = "Invoice-like structure detected.";
const REJECTED_REASON: &str = "Document does not look like an invoice/bill.";

/// Outcome of classifying a document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Whether the text looks like an invoice or bill.
    pub is_valid: bool,
    /// Human-readable explanation.
    pub reason: String,
    /// Signal breakdown behind the decision.
    pub signals: SignalBundle,
    /// Number of satisfied signal families (0..=4).
    pub score: u8,
}

/// Scores text against four independent signal families and accepts when
/// enough of them agree.
///
/// One missing family (e.g. an unrecognized date format) is tolerated; a stray
/// keyword on its own is not enough.
pub struct InvoiceClassifier {
    extractor: SignalExtractor,
}

impl InvoiceClassifier {
    pub fn new() -> Self {
        Self {
            extractor: SignalExtractor::new(),
        }
    }

    /// Classify raw extracted text. Never fails.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let normalized = normalize_whitespace(text);
        let signals = self.extractor.extract(&normalized);
        let score = signals.score();
        let is_valid = score >= MIN_SCORE;

        debug!(
            "Signals: keywords={}, amount={}, document_number={}, date={}",
            signals.keyword_hit_count,
            signals.has_amount,
            signals.has_document_number,
            signals.has_date
        );
        info!(score, is_valid, "Classified {} characters of text", text.len());

        ClassificationResult {
            is_valid,
            reason: if is_valid { ACCEPTED_REASON } else { REJECTED_REASON }.to_string(),
            signals,
            score,
        }
    }
}

impl Default for InvoiceClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse every whitespace run (including newlines) into a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
