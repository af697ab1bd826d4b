use crate::error::ExtractionError;
use std::fs;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Supplies the raw text of a document, one string per page.
pub trait TextSource: Send + Sync {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractionError>;

    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        Ok(self.extract_pages(path)?.join("\n"))
    }
}

/// Picks a reader by extension: PDFs through pdf-extract, plain text files
/// read as a single page.
pub struct DocumentTextSource {
    max_pages: usize,
}

impl DocumentTextSource {
    /// `max_pages == 0` keeps every page.
    pub fn new(max_pages: usize) -> Self {
        Self { max_pages }
    }
}

impl TextSource for DocumentTextSource {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("pdf") => {
                let bytes = fs::read(path)?;
                pdf_pages(&bytes, self.max_pages)
            }
            Some("txt" | "md" | "csv") => {
                let bytes = fs::read(path)?;
                Ok(vec![String::from_utf8_lossy(&bytes).into_owned()])
            }
            _ => Err(ExtractionError::UnsupportedFormat),
        }
    }
}

/// Text of the first `max_pages` pages of an in-memory PDF.
pub fn pdf_pages(pdf_bytes: &[u8], max_pages: usize) -> Result<Vec<String>, ExtractionError> {
    // pdf-extract panics on some malformed inputs.
    let mut pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(pdf_bytes))
        .map_err(|_| ExtractionError::PdfParsing("parser panicked".to_string()))?
        .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

    if max_pages > 0 {
        pages.truncate(max_pages);
    }
    Ok(pages)
}

/// Run `source` on its own thread and give up after `timeout`. A timed-out
/// extraction keeps running in the background but its result is dropped.
pub fn extract_with_timeout(
    source: Arc<dyn TextSource>,
    path: PathBuf,
    timeout: Option<Duration>,
) -> Result<Vec<String>, ExtractionError> {
    let Some(limit) = timeout else {
        return source.extract_pages(&path);
    };

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("extract".to_string())
        .spawn(move || {
            let _ = tx.send(source.extract_pages(&path));
        })?;

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ExtractionError::Timeout(limit)),
        Err(RecvTimeoutError::Disconnected) => Err(ExtractionError::WorkerLost),
    }
}
