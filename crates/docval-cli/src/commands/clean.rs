//! Clean command - remove rasterized page images from the working directory.

use std::path::PathBuf;

use clap::Args;
use console::style;

use docval_core::WorkDir;

use super::load_config;

/// Arguments for the clean command.
#[derive(Args)]
pub struct CleanArgs {
    /// Working directory (default: storage.work_dir from config)
    #[arg(short, long)]
    work_dir: Option<PathBuf>,
}

pub fn run(args: CleanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let work_dir = match args.work_dir {
        Some(dir) => WorkDir::new(dir),
        None => WorkDir::new(load_config(config_path)?.storage.work_dir),
    };

    let removed = work_dir.purge_page_images()?;

    if removed > 0 {
        println!(
            "{} Removed {} page images from {}",
            style("✓").green(),
            removed,
            work_dir.path().display()
        );
    } else {
        println!(
            "{} No page images in {}",
            style("ℹ").blue(),
            work_dir.path().display()
        );
    }

    Ok(())
}
