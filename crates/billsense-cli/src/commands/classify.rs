//! Classify command - check whether a document looks like an invoice.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use billsense_core::invoice::InvoiceClassifier;
use billsense_core::pipeline::read_document;

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Input file (PDF or plain text)
    #[arg(required = true)]
    input: PathBuf,
}

pub async fn run(args: ClassifyArgs) -> anyhow::Result<()> {
    let text = read_document(&args.input)?;

    info!("Classifying file: {}", args.input.display());
    let classification = InvoiceClassifier::new().classify(&text);

    println!("{}", serde_json::to_string_pretty(&classification)?);

    if !classification.is_valid {
        anyhow::bail!("{}", classification.reason);
    }

    Ok(())
}
