//! Invoice detection: signal extraction, classification and field rules.

mod classifier;
pub mod rules;
mod signals;

pub use classifier::{normalize_whitespace, ClassificationResult, InvoiceClassifier, MIN_SCORE};
pub use signals::{SignalBundle, SignalExtractor};
