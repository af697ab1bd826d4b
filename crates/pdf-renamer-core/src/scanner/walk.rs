use crate::config::AppConfig;
use crate::error::Error;
use crate::model::parent_dir;
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// The files of one batch and the directory they will be renamed in.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub directory: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Expand `path` into a batch. A file is a batch of one; a directory yields
/// its immediate children with a recognized extension, sorted by name.
/// Symlinks and anything matching an ignore pattern are skipped.
pub fn discover(path: &Path, config: &AppConfig) -> Result<Discovery, Error> {
    let metadata = path
        .metadata()
        .map_err(|e| Error::discovery(path, e.to_string()))?;

    if metadata.is_file() {
        let directory = parent_dir(path).to_path_buf();
        info!("Single file mode: {}", path.display());
        return Ok(Discovery {
            directory,
            files: vec![path.to_path_buf()],
        });
    }

    if !metadata.is_dir() {
        return Err(Error::discovery(path, "not a file or directory"));
    }

    let ignore_patterns = compile_patterns(&config.ignore_patterns);
    let mut files = Vec::new();

    for entry in WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::discovery(path, e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !config.matches_extension(&name) {
            continue;
        }
        if ignore_patterns
            .iter()
            .any(|pattern| pattern.matches(&name) || pattern.matches_path(entry.path()))
        {
            debug!("Ignoring {}", entry.path().display());
            continue;
        }
        files.push(entry.into_path());
    }

    info!("Found {} candidate files in {}", files.len(), path.display());
    Ok(Discovery {
        directory: path.to_path_buf(),
        files,
    })
}

fn compile_patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}
