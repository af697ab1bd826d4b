use crate::error::Error;
use crate::model::{BatchSummary, FileStatus, Plan, PlanAction, RenamePlanEntry};
use crate::progress::ProgressReporter;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Walk the plan and count as if every rename succeeded.
    #[default]
    DryRun,
    Commit,
}

/// Final state of one plan entry after execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOutcome {
    pub source_path: PathBuf,
    pub destination_name: String,
    pub action: PlanAction,
    pub status: FileStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CommitReport {
    pub summary: BatchSummary,
    pub outcomes: Vec<EntryOutcome>,
    /// Backup directory used for this batch, if any.
    pub backup_dir: Option<PathBuf>,
}

pub struct Executor {
    mode: ExecutionMode,
}

impl Executor {
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Apply `plan`. In commit mode nothing happens unless the backup of the
    /// batch has completed; individual rename failures are recorded and the
    /// remaining entries still run.
    pub fn commit(
        &self,
        plan: &Plan,
        backup_completed: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<CommitReport, Error> {
        if self.mode == ExecutionMode::Commit && !backup_completed {
            error!("Refusing to rename {} files without a completed backup", plan.len());
            return Err(Error::BackupIncomplete);
        }

        let mut report = CommitReport::default();
        for entry in plan.entries() {
            let outcome = self.apply_entry(entry, &mut report.summary);
            reporter.on_entry_applied(&outcome);
            report.outcomes.push(outcome);
        }

        info!(
            "{} {} of {} files ({} errors)",
            if self.mode == ExecutionMode::DryRun {
                "Would rename"
            } else {
                "Renamed"
            },
            report.summary.renamed,
            report.summary.processed,
            report.summary.errors,
        );
        Ok(report)
    }

    fn apply_entry(&self, entry: &RenamePlanEntry, summary: &mut BatchSummary) -> EntryOutcome {
        let outcome = |status: FileStatus, error: Option<String>| EntryOutcome {
            source_path: entry.source_path.clone(),
            destination_name: entry.destination_name.clone(),
            action: entry.action,
            status,
            error,
        };

        match entry.action {
            PlanAction::SkipAlreadyFormatted => {
                summary.record_already_formatted();
                outcome(FileStatus::SkippedAlreadyFormatted, None)
            }
            PlanAction::SkipNoDate => {
                summary.record_no_date();
                outcome(FileStatus::SkippedNoDate, None)
            }
            PlanAction::SkipUnreadable | PlanAction::SkipUnresolvableCollision => {
                summary.record_error();
                outcome(FileStatus::Failed, entry.note.clone())
            }
            PlanAction::Rename => match self.rename(entry) {
                Ok(()) => {
                    summary.record_renamed();
                    outcome(FileStatus::Renamed, None)
                }
                Err(e) => {
                    error!("Error renaming {}: {}", entry.original_name, e);
                    summary.record_error();
                    outcome(FileStatus::Failed, Some(e.to_string()))
                }
            },
        }
    }

    fn rename(&self, entry: &RenamePlanEntry) -> io::Result<()> {
        let destination = entry.destination_path();
        if self.mode == ExecutionMode::DryRun {
            debug!("Would rename: {} -> {}", entry.original_name, entry.destination_name);
            return Ok(());
        }

        // fs::rename replaces an existing target on most platforms.
        if fs::symlink_metadata(&destination).is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", destination.display()),
            ));
        }
        fs::rename(&entry.source_path, &destination)?;
        debug!("Renamed: {} -> {}", entry.original_name, entry.destination_name);
        Ok(())
    }
}
