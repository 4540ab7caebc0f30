//! Models command - download and manage OCR models for the ONNX engine.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand, ValueEnum};
use console::style;
use futures_util::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use docval_core::DocvalConfig;

use super::load_config;

/// Fallback download location, laid out as `{base}/{variant}/{filename}`.
///
/// A third-party GitHub repository that publishes PaddleOCR ONNX exports in
/// this layout. Point `models.download_url` or `--base-url` at a mirror to
/// use another host.
const DEFAULT_BASE_URL: &str = "https://github.com/jakubmatias/incr/raw/main/models";

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List available models
    List,

    /// Download models
    Download(DownloadArgs),

    /// Check model status
    Status(StatusArgs),

    /// Remove downloaded models
    Clean(CleanArgs),

    /// Set the active model variant
    Use(UseArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelVariant {
    /// Mobile models - smaller, faster (~12MB)
    Mobile,
    /// Server models - better detection accuracy (~92MB)
    Server,
}

impl ModelVariant {
    const ALL: [ModelVariant; 2] = [ModelVariant::Mobile, ModelVariant::Server];
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelVariant::Mobile => write!(f, "mobile"),
            ModelVariant::Server => write!(f, "server"),
        }
    }
}

#[derive(Args)]
struct DownloadArgs {
    /// Model variant to download
    #[arg(short, long, value_enum, default_value = "mobile")]
    variant: ModelVariant,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force re-download even if files exist
    #[arg(long)]
    force: bool,

    /// Base URL to download from (default: models.download_url from config)
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Args)]
struct StatusArgs {
    /// Check specific variant only
    #[arg(short, long, value_enum)]
    variant: Option<ModelVariant>,
}

#[derive(Args)]
struct CleanArgs {
    /// Clean specific variant only
    #[arg(short, long, value_enum)]
    variant: Option<ModelVariant>,

    /// Clean all variants
    #[arg(long)]
    all: bool,
}

#[derive(Args)]
struct UseArgs {
    /// Variant to set as active
    #[arg(value_enum)]
    variant: ModelVariant,
}

/// A model file and its approximate size.
struct ModelFile {
    filename: &'static str,
    size_bytes: u64,
    description: &'static str,
}

impl ModelFile {
    fn url(&self, base_url: &str, variant: ModelVariant) -> String {
        format!("{}/{}/{}", base_url.trim_end_matches('/'), variant, self.filename)
    }

    /// Present and at least half the expected size.
    fn is_complete(&self, dir: &Path) -> bool {
        fs::metadata(dir.join(self.filename))
            .map(|m| m.len() > self.size_bytes / 2)
            .unwrap_or(false)
    }
}

/// Files in a variant: detection, recognition, dictionary.
fn variant_files(variant: ModelVariant) -> [ModelFile; 3] {
    let (det_size, det_description) = match variant {
        ModelVariant::Mobile => (4_500_000, "PP-OCRv3 mobile detection"),
        ModelVariant::Server => (84_000_000, "PP-OCRv5 server detection"),
    };

    [
        ModelFile {
            filename: "det.onnx",
            size_bytes: det_size,
            description: det_description,
        },
        ModelFile {
            filename: "latin_rec.onnx",
            size_bytes: 7_500_000,
            description: "Latin recognition",
        },
        ModelFile {
            filename: "latin_dict.txt",
            size_bytes: 2_000,
            description: "Latin character dictionary",
        },
    ]
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docval")
}

/// Directory holding the files of one variant.
pub fn variant_dir(variant: ModelVariant) -> PathBuf {
    data_dir().join("models").join(variant.to_string())
}

/// The variant selected with `docval models use`, mobile by default.
pub fn active_variant() -> ModelVariant {
    match fs::read_to_string(data_dir().join("active_variant")) {
        Ok(content) if content.trim() == "server" => ModelVariant::Server,
        _ => ModelVariant::Mobile,
    }
}

fn set_active_variant(variant: ModelVariant) -> anyhow::Result<()> {
    let dir = data_dir();
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("active_variant"), variant.to_string())?;
    Ok(())
}

pub async fn run(args: ModelsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::List => list_models(),
        ModelsCommand::Download(download_args) => {
            let config = load_config(config_path)?;
            let base_url = download_base(download_args.base_url.as_deref(), &config).to_string();
            download_models(download_args, &base_url).await
        }
        ModelsCommand::Status(status_args) => check_status(status_args),
        ModelsCommand::Clean(clean_args) => clean_models(clean_args),
        ModelsCommand::Use(use_args) => use_variant(use_args),
    }
}

fn list_models() -> anyhow::Result<()> {
    println!("{}", style("Available Model Variants").bold());
    println!();

    let active = active_variant();

    for variant in ModelVariant::ALL {
        let files = variant_files(variant);
        let total_size: u64 = files.iter().map(|f| f.size_bytes).sum();
        let active_marker = if variant == active { " (active)" } else { "" };

        println!(
            "{} {}{}",
            style(format!("▸ {}", variant)).bold().cyan(),
            format_size(total_size),
            style(active_marker).green().bold()
        );

        for file in &files {
            println!(
                "    {:<20} {:>10}  {}",
                file.filename,
                format_size(file.size_bytes),
                file.description
            );
        }
        println!();
    }

    println!("Commands:");
    println!("  docval models download -v mobile    Download mobile models");
    println!("  docval models download -v server    Download server models");
    println!("  docval models use <variant>         Switch active variant");

    Ok(())
}

fn use_variant(args: UseArgs) -> anyhow::Result<()> {
    let dir = variant_dir(args.variant);

    if !variant_files(args.variant).iter().all(|f| dir.join(f.filename).exists()) {
        println!(
            "{} {} models not downloaded yet.",
            style("⚠").yellow(),
            args.variant
        );
        println!("Run: docval models download -v {}", args.variant);
        return Ok(());
    }

    set_active_variant(args.variant)?;
    println!(
        "{} Switched to {} models",
        style("✓").green(),
        style(args.variant.to_string()).cyan().bold()
    );

    Ok(())
}

/// The `--base-url` flag wins over `models.download_url`, then the built-in host.
fn download_base<'a>(cli: Option<&'a str>, config: &'a DocvalConfig) -> &'a str {
    cli.or(config.models.download_url.as_deref())
        .unwrap_or(DEFAULT_BASE_URL)
}

async fn download_models(args: DownloadArgs, base_url: &str) -> anyhow::Result<()> {
    let variant = args.variant;
    let output_dir = args.output.unwrap_or_else(|| variant_dir(variant));
    fs::create_dir_all(&output_dir)?;

    println!(
        "{} Downloading {} models to {}",
        style("ℹ").blue(),
        style(variant.to_string()).cyan().bold(),
        output_dir.display()
    );
    println!();

    let client = reqwest::Client::builder()
        .user_agent(concat!("docval-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let style_template = ProgressStyle::default_bar()
        .template("  {spinner:.green} {msg:<30} [{bar:25.cyan/blue}] {bytes}/{total_bytes}")?
        .progress_chars("=>-");

    let multi_progress = MultiProgress::new();
    let mut failed = 0;

    for file in variant_files(variant) {
        let path = output_dir.join(file.filename);

        if !args.force && file.is_complete(&output_dir) {
            println!("  {} {} (already exists)", style("✓").green(), file.filename);
            continue;
        }

        let pb = multi_progress.add(ProgressBar::new(file.size_bytes));
        pb.set_style(style_template.clone());
        pb.set_message(file.filename.to_string());

        let url = file.url(base_url, variant);
        debug!("Downloading {}", url);

        match download_file(&client, &url, &path, &pb).await {
            Ok(()) => {
                pb.finish_with_message(format!("{} {}", style("✓").green(), file.filename));
            }
            Err(e) => {
                warn!("Download of {} failed: {}", url, e);
                pb.finish_with_message(format!("{} {} - {}", style("✗").red(), file.filename, e));
                failed += 1;
            }
        }
    }

    println!();

    if failed == 0 {
        println!(
            "{} {} models ready in {}",
            style("✓").green().bold(),
            variant,
            output_dir.display()
        );
        if active_variant() != variant {
            println!(
                "{} To use these models, run: docval models use {}",
                style("ℹ").blue(),
                variant
            );
        }
        Ok(())
    } else {
        anyhow::bail!(
            "{} model files failed to download. Retry with: docval models download -v {} --force",
            failed,
            variant
        )
    }
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    pb: &ProgressBar,
) -> anyhow::Result<()> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }

    if let Some(content_length) = response.content_length() {
        pb.set_length(content_length);
    }

    // Write to a temp file so an interrupted download never looks complete
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    Ok(())
}

fn check_status(args: StatusArgs) -> anyhow::Result<()> {
    let active = active_variant();

    println!("{}", style("Model Status").bold());
    println!("Active variant: {}", style(active.to_string()).cyan().bold());
    println!();

    let variants = match args.variant {
        Some(v) => vec![v],
        None => ModelVariant::ALL.to_vec(),
    };

    for variant in variants {
        let dir = variant_dir(variant);
        let active_marker = if variant == active {
            style(" ◀ active").green().to_string()
        } else {
            String::new()
        };

        println!(
            "{} {}{}",
            style(format!("▸ {}", variant)).bold(),
            dir.display(),
            active_marker
        );

        let mut ready = true;
        for file in &variant_files(variant) {
            let status = match fs::metadata(dir.join(file.filename)) {
                Ok(_) if file.is_complete(&dir) => style("✓").green(),
                Ok(_) => {
                    ready = false;
                    style("⚠").yellow()
                }
                Err(_) => {
                    ready = false;
                    style("✗").red()
                }
            };
            println!("    {} {}", status, file.filename);
        }

        if ready {
            println!("    {} Ready", style("✓").green());
        } else {
            println!(
                "    {} Run 'docval models download -v {}' to download",
                style("⚠").yellow(),
                variant
            );
        }
        println!();
    }

    Ok(())
}

fn clean_models(args: CleanArgs) -> anyhow::Result<()> {
    let variants = if args.all {
        ModelVariant::ALL.to_vec()
    } else if let Some(v) = args.variant {
        vec![v]
    } else {
        println!(
            "{} Specify --all to remove all models or -v <variant> for specific variant",
            style("ℹ").blue()
        );
        return Ok(());
    };

    let mut removed = 0;
    let mut freed: u64 = 0;

    for variant in variants {
        let dir = variant_dir(variant);
        if !dir.exists() {
            continue;
        }

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let known = variant_files(variant)
                .iter()
                .any(|f| path.file_name().is_some_and(|n| n == f.filename));
            let partial = path.extension().is_some_and(|e| e == "tmp");

            if known || partial {
                freed += fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                fs::remove_file(&path)?;
                removed += 1;
                debug!("Removed {}", path.display());
            }
        }
    }

    if removed > 0 {
        println!(
            "{} Removed {} files, freed {}",
            style("✓").green(),
            removed,
            format_size(freed)
        );
    } else {
        println!("{} No model files to remove.", style("ℹ").blue());
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}
