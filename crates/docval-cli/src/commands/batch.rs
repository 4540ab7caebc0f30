//! Batch processing command for multiple documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use docval_core::models::document::ProcessedDocument;
use docval_core::DocumentKind;

use super::process::{field_value_to_string, format_document, OutputFormat};
use super::{build_pipeline, load_config, resolve_model_dir};

const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input files
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Outcome of processing a single file.
struct FileResult {
    path: PathBuf,
    document: Result<ProcessedDocument, String>,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files = matching_files(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let model_dir = resolve_model_dir(args.model_dir.as_deref(), &config);
    let pipeline = build_pipeline(&config, &model_dir)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let document = pipeline.process_document(&path, DocumentKind::from_path(&path));

        match document {
            Ok(document) => {
                if let Some(ref output_dir) = args.output_dir {
                    write_output(output_dir, &path, &document, args.format)?;
                }
                results.push(FileResult {
                    path,
                    document: Ok(document),
                });
            }
            Err(e) if args.continue_on_error => {
                warn!("Failed to process {}: {}", path.display(), e);
                results.push(FileResult {
                    path,
                    document: Err(e.to_string()),
                });
            }
            Err(e) => {
                pb.abandon();
                error!("Failed to process {}: {}", path.display(), e);
                anyhow::bail!("Extraction failed for {}: {}", path.display(), e);
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<&FileResult> = results.iter().filter(|r| r.document.is_err()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            if let Err(message) = &result.document {
                println!("  - {}: {}", result.path.display(), message);
            }
        }
    }

    Ok(())
}

/// Files matching `pattern` with a supported extension, in glob order.
fn matching_files(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    Ok(glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .collect())
}

fn write_output(
    output_dir: &Path,
    input: &Path,
    document: &ProcessedDocument,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let output_path = output_dir.join(format!("{}.{}", stem, format.extension()));

    fs::write(&output_path, format_document(document, format)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["filename", "status", "document_type", "fields", "elapsed_seconds", "error"])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match &result.document {
            Ok(document) => {
                let status = if document.outcome.is_no_text() {
                    "no_text"
                } else {
                    "success"
                };
                let fields = document
                    .outcome
                    .entries()
                    .into_iter()
                    .skip(1)
                    .map(|(key, value)| format!("{}={}", key, field_value_to_string(value)))
                    .collect::<Vec<_>>()
                    .join(" | ");

                wtr.write_record([
                    filename,
                    status,
                    document.outcome.document_type().label(),
                    &fields,
                    &format!("{:.2}", document.elapsed_seconds()),
                    "",
                ])?;
            }
            Err(message) => {
                wtr.write_record([filename, "error", "", "", "", message.as_str()])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docval_core::process_text;

    #[test]
    fn test_matching_files_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.pdf", "b.PNG", "notes.txt", "c.jpeg"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let pattern = format!("{}/*", dir.path().display());
        let mut names: Vec<String> = matching_files(&pattern)
            .unwrap()
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect();
        names.sort();

        assert_eq!(names, ["a.pdf", "b.PNG", "c.jpeg"]);
    }

    #[test]
    fn test_summary_rows() {
        let dir = tempfile::tempdir().unwrap();
        let summary = dir.path().join("summary.csv");
        let results = vec![
            FileResult {
                path: PathBuf::from("pan.jpg"),
                document: Ok(process_text("INCOME TAX DEPARTMENT ABCDE1234F")),
            },
            FileResult {
                path: PathBuf::from("blank.png"),
                document: Ok(process_text("")),
            },
            FileResult {
                path: PathBuf::from("broken.pdf"),
                document: Err("PDF error: PDF has no pages".to_string()),
            },
        ];

        write_summary(&summary, &results).unwrap();
        let content = fs::read_to_string(&summary).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "filename,status,document_type,fields,elapsed_seconds,error");
        assert!(lines[1].starts_with("pan.jpg,success,PAN Card,PAN=ABCDE1234F"));
        assert!(lines[2].starts_with("blank.png,no_text,Unknown Document,"));
        assert_eq!(lines[3], "broken.pdf,error,,,,PDF error: PDF has no pages");
    }
}
