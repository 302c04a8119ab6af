//! Analyze command - classify a document and extract its invoice fields.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use billsense_core::error::{BillsenseError, ErrorKind};
use billsense_core::invoice::ClassificationResult;
use billsense_core::models::invoice::{EnvelopeStatus, ExtractionEnvelope};
use billsense_core::pipeline::{read_document, Outcome, Pipeline};

use super::load_config;

const ACCEPTED_MESSAGE: &str = "Document is valid and accepted for AI analysis.";

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input file (PDF or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Hide the progress spinner
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    message: &'a str,
    file: String,
    validation: &'a ClassificationResult,
    ai_analysis: &'a ExtractionEnvelope,
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let text = read_document(&args.input).map_err(describe_failure)?;

    info!("Analyzing file: {}", args.input.display());

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };
    pb.set_message("Analyzing document...");

    // The orchestrator blocks on HTTP; build and run it off the async runtime
    let outcome = tokio::task::spawn_blocking(move || {
        let pipeline = Pipeline::from_config(&config)?;
        pipeline.run(&text)
    })
    .await?;

    pb.finish_and_clear();

    let (classification, envelope) = match outcome.map_err(describe_failure)? {
        Outcome::Rejected(classification) => {
            anyhow::bail!(
                "{} (score {}/4)",
                classification.reason,
                classification.score
            );
        }
        Outcome::Accepted {
            classification,
            envelope,
        } => (classification, envelope),
    };

    let report = AnalysisReport {
        message: ACCEPTED_MESSAGE,
        file: args.input.display().to_string(),
        validation: &classification,
        ai_analysis: &envelope,
    };

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Text => format_text(&report),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Attach the failure category so callers can tell local from upstream problems.
fn describe_failure(error: BillsenseError) -> anyhow::Error {
    let context = match error.kind() {
        ErrorKind::Configuration => "AI provider is not configured correctly",
        ErrorKind::TransientProvider => "AI provider is temporarily unavailable",
        ErrorKind::ResponseFormat => "AI provider returned an unusable response",
        ErrorKind::InputFormat => "Document could not be read",
    };
    anyhow::Error::new(error).context(context)
}

fn format_text(report: &AnalysisReport<'_>) -> String {
    let envelope = report.ai_analysis;
    let record = &envelope.result;
    let mut output = String::new();

    output.push_str(&format!("File: {}\n", report.file));
    output.push_str(&format!(
        "Classification: {} (score {}/4)\n",
        report.validation.reason, report.validation.score
    ));
    output.push('\n');

    let source = match envelope.status {
        EnvelopeStatus::Ok => format!("{} / {}", envelope.provider, envelope.model),
        EnvelopeStatus::Mocked => format!("{} (local analysis)", envelope.provider),
    };
    output.push_str(&format!("Extracted by: {}\n", source));
    if let Some(mode) = &envelope.api_mode {
        output.push_str(&format!("API mode: {}\n", mode));
    }
    if let Some(note) = &record.note {
        output.push_str(&format!("Note: {}\n", note));
    }
    output.push('\n');

    output.push_str(&format!("Document type: {}\n", record.document_type()));
    for (label, field) in [
        ("Invoice number", "invoice_number"),
        ("Invoice date", "invoice_date"),
        ("Due date", "due_date"),
        ("Vendor", "vendor_name"),
        ("Customer", "customer_name"),
        ("Payment terms", "payment_terms"),
    ] {
        if let Some(value) = record.text(field) {
            output.push_str(&format!("{}: {}\n", label, value));
        }
    }

    let currency = record.text("currency").unwrap_or("");
    for (label, field) in [
        ("Subtotal", "subtotal_amount"),
        ("Tax", "tax_amount"),
        ("Total", "total_amount"),
    ] {
        if let Some(amount) = record.number(field) {
            output.push_str(&format!("{}: {:.2} {}\n", label, amount, currency));
        }
    }

    let items = record.typed_line_items();
    if !items.is_empty() {
        output.push_str("\nLine items:\n");
        for item in &items {
            match item.line_total {
                Some(total) => output.push_str(&format!("  - {} ({:.2})\n", item.description, total)),
                None => output.push_str(&format!("  - {}\n", item.description)),
            }
        }
    }

    output.push_str(&format!("\nConfidence: {:.0}%\n", record.confidence() * 100.0));
    output
}
