use crate::name::{self, NormalizedName};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Discovered,
    Extracted,
    DateResolved,
    DateMissing,
    Planned,
    Renamed,
    SkippedNoDate,
    SkippedAlreadyFormatted,
    Failed,
}

impl FileStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FileStatus::Renamed
                | FileStatus::SkippedNoDate
                | FileStatus::SkippedAlreadyFormatted
                | FileStatus::Failed
        )
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileStatus::Discovered => "discovered",
            FileStatus::Extracted => "extracted",
            FileStatus::DateResolved => "date_resolved",
            FileStatus::DateMissing => "date_missing",
            FileStatus::Planned => "planned",
            FileStatus::Renamed => "renamed",
            FileStatus::SkippedNoDate => "skipped_no_date",
            FileStatus::SkippedAlreadyFormatted => "skipped_already_formatted",
            FileStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Parent directory of `path`, with a bare file name mapping to `.`.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// One discovered document as it moves through the pipeline.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub original_name: String,
    pub normalized: NormalizedName,
    pub extracted_text: Option<String>,
    pub resolved_date: Option<NaiveDate>,
    pub status: FileStatus,
    pub error: Option<String>,
}

impl SourceFile {
    pub fn discovered(path: PathBuf) -> Self {
        let original_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let normalized = name::normalize(&original_name);
        Self {
            path,
            original_name,
            normalized,
            extracted_text: None,
            resolved_date: None,
            status: FileStatus::Discovered,
            error: None,
        }
    }

    pub fn set_text(&mut self, text: String) {
        self.extracted_text = Some(text);
        self.status = FileStatus::Extracted;
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.resolved_date = date;
        self.status = match date {
            Some(_) => FileStatus::DateResolved,
            None => FileStatus::DateMissing,
        };
    }

    pub fn fail(&mut self, error: impl fmt::Display) {
        self.error = Some(error.to_string());
        self.status = FileStatus::Failed;
    }

    /// The file has an entry in the plan. A failed file stays failed.
    pub fn mark_planned(&mut self) {
        if self.status != FileStatus::Failed {
            self.status = FileStatus::Planned;
        }
    }

    /// Record the terminal state reached by this file's plan entry.
    pub fn finish(&mut self, status: FileStatus, error: Option<String>) {
        self.status = status;
        if error.is_some() {
            self.error = error;
        }
    }

    pub fn directory(&self) -> &Path {
        parent_dir(&self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Rename,
    SkipNoDate,
    SkipAlreadyFormatted,
    SkipUnresolvableCollision,
    /// Text extraction failed; counted as an error.
    SkipUnreadable,
}

impl PlanAction {
    pub fn is_skip(self) -> bool {
        !matches!(self, PlanAction::Rename)
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlanAction::Rename => "rename",
            PlanAction::SkipNoDate => "skip_no_date",
            PlanAction::SkipAlreadyFormatted => "skip_already_formatted",
            PlanAction::SkipUnresolvableCollision => "skip_unresolvable_collision",
            PlanAction::SkipUnreadable => "skip_unreadable",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlanEntry {
    pub source_path: PathBuf,
    pub original_name: String,
    /// For skips this is the unchanged original name.
    pub destination_name: String,
    pub action: PlanAction,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl RenamePlanEntry {
    pub fn destination_path(&self) -> PathBuf {
        parent_dir(&self.source_path).join(&self.destination_name)
    }
}

/// The full ordered set of decisions for a batch. Only the planner builds
/// one; afterwards it is read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    entries: Vec<RenamePlanEntry>,
}

impl Plan {
    pub(crate) fn from_entries(entries: Vec<RenamePlanEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RenamePlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn renames(&self) -> impl Iterator<Item = &RenamePlanEntry> {
        self.entries.iter().filter(|e| e.action == PlanAction::Rename)
    }

    pub fn has_renames(&self) -> bool {
        self.renames().next().is_some()
    }

    pub fn count(&self, action: PlanAction) -> usize {
        self.entries.iter().filter(|e| e.action == action).count()
    }
}

/// Counters for one batch.
/// `processed == renamed + skipped_already_formatted + skipped_no_date + errors`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub renamed: usize,
    pub skipped_already_formatted: usize,
    pub skipped_no_date: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn record_renamed(&mut self) {
        self.processed += 1;
        self.renamed += 1;
    }

    pub fn record_already_formatted(&mut self) {
        self.processed += 1;
        self.skipped_already_formatted += 1;
    }

    pub fn record_no_date(&mut self) {
        self.processed += 1;
        self.skipped_no_date += 1;
    }

    pub fn record_error(&mut self) {
        self.processed += 1;
        self.errors += 1;
    }

    pub fn is_balanced(&self) -> bool {
        self.processed
            == self.renamed + self.skipped_already_formatted + self.skipped_no_date + self.errors
    }
}
