use crate::executor::EntryOutcome;
use crate::model::Plan;
use std::path::Path;

/// Trait for reporting batch progress.
///
/// CLI implements with indicatif; tests and automation use `SilentReporter`.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_discovery_complete(&self, _total_files: usize, _directory: &Path) {}
    fn on_extract_start(&self, _total_files: usize) {}
    fn on_extract_progress(&self, _files_done: usize, _total_files: usize) {}
    fn on_extract_complete(&self, _dated_files: usize, _duration_secs: f64) {}
    /// Called once the plan is built, before any confirmation is asked.
    fn on_plan_ready(&self, _plan: &Plan) {}
    fn on_backup_complete(&self, _backup_dir: &Path, _files: usize, _reused: bool) {}
    fn on_entry_applied(&self, _outcome: &EntryOutcome) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Decides whether a prepared plan goes ahead. Asked once, after the plan
/// has been shown and before anything is committed.
pub trait ConfirmationGate {
    fn confirm_proceed(&self, plan: &Plan) -> bool;
}

/// Always proceeds.
pub struct AutoConfirm;

impl ConfirmationGate for AutoConfirm {
    fn confirm_proceed(&self, _plan: &Plan) -> bool {
        true
    }
}
