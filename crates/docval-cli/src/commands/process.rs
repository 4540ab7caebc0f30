//! Process command - classify and validate a single document.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docval_core::models::document::{FieldValue, ProcessedDocument};
use docval_core::{DocumentKind, WorkDir};

use super::{build_pipeline, load_config, resolve_model_dir};

/// Shown instead of a field listing when OCR finds nothing.
const NO_TEXT_FOUND: &str = "No text found in the uploaded document.";

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Copy the input into the working directory before processing
    #[arg(long)]
    stage: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output (one row per field)
    Csv,
    /// Plain text report
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let kind = DocumentKind::from_path(&args.input);
    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    let input = if args.stage {
        pb.set_message("Staging document...");
        WorkDir::new(&config.storage.work_dir).stage(&args.input)?
    } else {
        args.input.clone()
    };

    pb.set_message("Loading OCR engine...");
    let model_dir = resolve_model_dir(args.model_dir.as_deref(), &config);
    let pipeline = build_pipeline(&config, &model_dir);
    let pipeline = match pipeline {
        Ok(pipeline) => pipeline,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.set_message(match kind {
        DocumentKind::Pdf => "Rasterizing and recognizing pages...",
        DocumentKind::Image => "Recognizing text...",
    });
    let processed = pipeline.process_document(&input, kind);
    pb.finish_and_clear();

    let processed = processed.map_err(|e| anyhow::anyhow!("Extraction failed: {}", e))?;
    let output = format_document(&processed, args.format)?;

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

/// Render a processed document in the requested format.
pub fn format_document(doc: &ProcessedDocument, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(doc)?),
        OutputFormat::Csv => format_csv(doc),
        OutputFormat::Text => Ok(format_text(doc)),
    }
}

/// Multiple matches are joined with "; ".
pub fn field_value_to_string(value: FieldValue<'_>) -> String {
    match value {
        FieldValue::DocumentType(doc_type) => doc_type.label().to_string(),
        FieldValue::Matches(matches) => matches.join("; "),
        FieldValue::Message(message) => message.to_string(),
    }
}

fn format_csv(doc: &ProcessedDocument) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["field", "value"])?;
    for (key, value) in doc.outcome.entries() {
        wtr.write_record([key, field_value_to_string(value).as_str()])?;
    }
    wtr.write_record(["Elapsed Seconds", &format!("{:.2}", doc.elapsed_seconds())])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(doc: &ProcessedDocument) -> String {
    let mut output = String::new();

    output.push_str("Extracted Text:\n");
    output.push_str(doc.extracted_text.trim_end());
    output.push_str("\n\n");

    if doc.outcome.is_no_text() {
        output.push_str(NO_TEXT_FOUND);
        output.push('\n');
    } else {
        output.push_str("Validation Results:\n");
        for (key, value) in doc.outcome.entries() {
            let rendered = match value {
                FieldValue::Matches([]) => "(none)".to_string(),
                other => field_value_to_string(other),
            };
            output.push_str(&format!("  {}: {}\n", key, rendered));
        }
    }

    output.push_str(&format!("\nTime taken: {:.2} seconds\n", doc.elapsed_seconds()));
    output
}
