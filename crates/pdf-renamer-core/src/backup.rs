use crate::error::Error;
use chrono::{Local, NaiveDateTime};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const BACKUP_PREFIX: &str = "backup_";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReceipt {
    pub backup_dir: PathBuf,
    pub files: usize,
    /// True when an earlier, still identical backup was used instead of a new copy.
    pub reused: bool,
}

/// Makes copies of a batch before anything in it is renamed.
pub trait BackupService: Send + Sync {
    fn backup_all(&self, directory: &Path, files: &[PathBuf]) -> Result<BackupReceipt, Error>;
}

/// Copies the batch into `backup_<YYYYMMDD_HHMMSS>` inside the batch
/// directory and checks every copy against its source.
pub struct DirectoryBackup {
    reuse_window: Option<Duration>,
}

impl DirectoryBackup {
    pub fn new(reuse_window: Option<Duration>) -> Self {
        Self { reuse_window }
    }
}

impl BackupService for DirectoryBackup {
    fn backup_all(&self, directory: &Path, files: &[PathBuf]) -> Result<BackupReceipt, Error> {
        if let Some(window) = self.reuse_window {
            if let Some(backup_dir) = find_reusable_backup(directory, files, window) {
                info!("Reusing recent backup: {}", backup_dir.display());
                return Ok(BackupReceipt {
                    backup_dir,
                    files: files.len(),
                    reused: true,
                });
            }
        }

        let backup_dir = create_backup_dir(directory)
            .map_err(|e| Error::Backup(format!("creating backup directory: {}", e)))?;

        for file in files {
            copy_verified(file, &backup_dir)?;
        }

        info!("Backup created in: {}", backup_dir.display());
        Ok(BackupReceipt {
            backup_dir,
            files: files.len(),
            reused: false,
        })
    }
}

fn create_backup_dir(directory: &Path) -> io::Result<PathBuf> {
    let base = format!("{}{}", BACKUP_PREFIX, Local::now().format(TIMESTAMP_FORMAT));
    let mut candidate = directory.join(&base);
    let mut suffix = 1;
    loop {
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && suffix < 100 => {
                candidate = directory.join(format!("{}_{}", base, suffix));
                suffix += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn copy_verified(file: &Path, backup_dir: &Path) -> Result<(), Error> {
    let name = file
        .file_name()
        .ok_or_else(|| Error::Backup(format!("{} has no file name", file.display())))?;
    let target = backup_dir.join(name);
    let context = |e: io::Error| Error::Backup(format!("{}: {}", file.display(), e));

    fs::copy(file, &target).map_err(context)?;
    let source_digest = digest(file).map_err(context)?;
    let copy_digest = digest(&target).map_err(context)?;
    if source_digest != copy_digest {
        return Err(Error::Backup(format!(
            "copy of {} does not match the original",
            file.display()
        )));
    }
    debug!("Backed up {}", file.display());
    Ok(())
}

pub fn digest(path: &Path) -> io::Result<blake3::Hash> {
    let mut hasher = blake3::Hasher::new();
    let mut f = File::open(path)?;
    io::copy(&mut f, &mut hasher)?;
    Ok(hasher.finalize())
}

/// Parse the creation time out of a `backup_<YYYYMMDD_HHMMSS>[_n]` name.
pub fn backup_timestamp(dir_name: &str) -> Option<NaiveDateTime> {
    let stamp = dir_name.strip_prefix(BACKUP_PREFIX)?.get(..15)?;
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// Newest `backup_*` directory under `directory`, if any.
pub fn find_latest_backup(directory: &Path) -> Option<PathBuf> {
    let mut backups: Vec<(NaiveDateTime, String)> = fs::read_dir(directory)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            backup_timestamp(&name).map(|ts| (ts, name))
        })
        .collect();
    backups.sort();
    backups.pop().map(|(_, name)| directory.join(name))
}

/// The latest backup, if it is younger than `window` and holds an identical
/// copy of every file in the batch.
pub fn find_reusable_backup(directory: &Path, files: &[PathBuf], window: Duration) -> Option<PathBuf> {
    let latest = find_latest_backup(directory)?;
    let name = latest.file_name()?.to_str()?;
    let created = backup_timestamp(name)?;
    let age = Local::now().naive_local().signed_duration_since(created);
    let window = chrono::Duration::from_std(window).ok()?;
    if age < chrono::Duration::zero() || age > window {
        debug!("Latest backup {} is outside the reuse window", latest.display());
        return None;
    }

    for file in files {
        let copy = latest.join(file.file_name()?);
        match (digest(file), digest(&copy)) {
            (Ok(a), Ok(b)) if a == b => {}
            (Ok(_), Ok(_)) => {
                debug!("{} changed since the last backup", file.display());
                return None;
            }
            (_, Err(_)) => return None,
            (Err(e), _) => {
                warn!("Could not read {} to compare with backup: {}", file.display(), e);
                return None;
            }
        }
    }
    Some(latest)
}
