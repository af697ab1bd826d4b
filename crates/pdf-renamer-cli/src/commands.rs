use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pdf-renamer")]
#[command(about = "Rename documents to YYYY-MM-DD_<name> using the date found in their text", long_about = None)]
#[command(version = concat!("v", env!("CARGO_PKG_VERSION")), disable_version_flag = true)]
pub struct Cli {
    /// A directory to process, or a single file
    pub path: PathBuf,

    /// Show what would be renamed without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Write a CSV report of the batch to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Extraction worker threads (0 = one per core)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Per-file extraction timeout in seconds (0 = none)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Always take a new backup, even if a recent identical one exists
    #[arg(long)]
    pub fresh_backup: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    #[allow(dead_code)]
    version: (),
}
