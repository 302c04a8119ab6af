//! Core library for invoice detection and AI-assisted field extraction.
//!
//! This crate provides:
//! - PDF text extraction
//! - Heuristic invoice classification from lexical and structural signals
//! - AI extraction against OpenAI-compatible providers, with tiered fallback
//! - Normalization of provider output onto a fixed invoice schema

pub mod ai;
pub mod error;
pub mod invoice;
pub mod models;
pub mod pdf;
pub mod pipeline;

pub use ai::{ExtractionOrchestrator, SchemaCoercer};
pub use error::{BillsenseError, ErrorKind, ExtractionError, PdfError, Result};
pub use invoice::{ClassificationResult, InvoiceClassifier, SignalBundle, SignalExtractor};
pub use models::config::{AiConfig, ApiSurface, BillsenseConfig};
pub use models::invoice::{EnvelopeStatus, ExtractionEnvelope, InvoiceRecord, LineItem};
pub use pdf::{extract_pdf_text, PdfExtractor, PdfProcessor};
pub use pipeline::{read_document, Outcome, Pipeline};
