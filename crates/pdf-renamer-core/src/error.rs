use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Batch-level failures. Anything returned from the engine as an `Err` aborts
/// the whole batch; per-file problems are recorded on the file instead.
///
/// Wrapped errors are reached through `source()`, so print with `{:#}`.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("Configuration error")]
    Config(#[from] config::ConfigError),

    #[error("Invalid path or file not found: {path}: {reason}")]
    Discovery { path: PathBuf, reason: String },

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Backup has not completed; refusing to rename")]
    BackupIncomplete,

    #[error("Worker pool error")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Report error")]
    Report(#[from] csv::Error),
}

impl Error {
    pub fn discovery(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Discovery {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Why the text of a single document could not be read.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Unsupported format for extraction")]
    UnsupportedFormat,

    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("Extraction worker exited without a result")]
    WorkerLost,
}
