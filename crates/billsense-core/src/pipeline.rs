//! Classifier gate in front of AI extraction, and document loading.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::ai::{ExtractionOrchestrator, SchemaCoercer};
use crate::error::{BillsenseError, Result};
use crate::invoice::{ClassificationResult, InvoiceClassifier};
use crate::models::config::BillsenseConfig;
use crate::models::invoice::ExtractionEnvelope;
use crate::pdf::extract_pdf_text;

/// Result of running a document through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The classifier rejected the document; the provider was not called.
    Rejected(ClassificationResult),
    /// The document was accepted and extraction completed.
    Accepted {
        classification: ClassificationResult,
        envelope: ExtractionEnvelope,
    },
}

impl Outcome {
    pub fn classification(&self) -> &ClassificationResult {
        match self {
            Self::Rejected(classification) => classification,
            Self::Accepted { classification, .. } => classification,
        }
    }

    pub fn envelope(&self) -> Option<&ExtractionEnvelope> {
        match self {
            Self::Rejected(_) => None,
            Self::Accepted { envelope, .. } => Some(envelope),
        }
    }
}

/// Classifies text and, when it looks like an invoice, extracts its fields.
pub struct Pipeline {
    classifier: InvoiceClassifier,
    orchestrator: ExtractionOrchestrator,
}

impl Pipeline {
    pub fn new(classifier: InvoiceClassifier, orchestrator: ExtractionOrchestrator) -> Self {
        Self {
            classifier,
            orchestrator,
        }
    }

    /// Build a pipeline from configuration.
    pub fn from_config(config: &BillsenseConfig) -> Result<Self> {
        let classifier = InvoiceClassifier::new();
        let coercer = if config.extraction.strict_types {
            SchemaCoercer::strict()
        } else {
            SchemaCoercer::new()
        };
        let orchestrator = ExtractionOrchestrator::new(config.ai.clone())?.with_coercer(coercer);
        Ok(Self::new(classifier, orchestrator))
    }

    /// Classify without extracting.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        self.classifier.classify(text)
    }

    /// Classify `text`, then extract its fields if it was accepted.
    ///
    /// Blocks on provider I/O.
    pub fn run(&self, text: &str) -> Result<Outcome> {
        let classification = self.classify(text);
        if !classification.is_valid {
            info!("Skipping extraction: {}", classification.reason);
            return Ok(Outcome::Rejected(classification));
        }

        let envelope = self.orchestrator.extract(text)?;
        Ok(Outcome::Accepted {
            classification,
            envelope,
        })
    }
}

/// Read document text from a PDF (by extension) or a UTF-8 text file.
pub fn read_document(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(BillsenseError::InvalidInput(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    let data = fs::read(path)?;
    if data.is_empty() {
        return Err(BillsenseError::InvalidInput("Input file is empty.".to_string()));
    }

    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        debug!("Extracting text from PDF ({} bytes)", data.len());
        Ok(extract_pdf_text(&data)?)
    } else {
        String::from_utf8(data).map_err(|_| {
            BillsenseError::InvalidInput("Input file is neither a PDF nor UTF-8 text".to_string())
        })
    }
}
