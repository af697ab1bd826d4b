use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_renamer_core::executor::EntryOutcome;
use pdf_renamer_core::{FileStatus, Plan, PlanAction, ProgressReporter};
use std::path::Path;
use std::sync::Mutex;

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// indicatif progress for the extraction phase, plain status lines for the rest.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_discovery_complete(&self, total_files: usize, directory: &Path) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Found {} file(s) in {}",
            total_files,
            directory.display()
        );
    }

    fn on_extract_start(&self, total_files: usize) {
        let pb = ProgressBar::new(total_files as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} Reading [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
        ) {
            pb.set_style(style.progress_chars("━╸─").tick_chars(TICKS));
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_extract_progress(&self, files_done: usize, _total_files: usize) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_position(files_done as u64);
            }
        }
    }

    fn on_extract_complete(&self, dated_files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Extraction complete: {} dated file(s) in {:.2}s",
            dated_files, duration_secs
        );
    }

    fn on_plan_ready(&self, plan: &Plan) {
        self.finish_bar();
        print_preview(plan);
    }

    fn on_backup_complete(&self, backup_dir: &Path, files: usize, reused: bool) {
        let verb = if reused { "Reusing backup of" } else { "Backed up" };
        eprintln!(
            "  \x1b[32m✓\x1b[0m {} {} file(s) in {}",
            verb,
            files,
            backup_dir.display()
        );
    }

    fn on_entry_applied(&self, outcome: &EntryOutcome) {
        if outcome.status == FileStatus::Failed {
            if let Some(err) = &outcome.error {
                eprintln!(
                    "  \x1b[31m✗\x1b[0m {}: {}",
                    outcome.source_path.display(),
                    err
                );
            }
        }
    }
}

/// Two-column `Original Name -> New Name` table, skip reasons in brackets.
fn print_preview(plan: &Plan) {
    if plan.is_empty() {
        return;
    }
    let width = plan
        .entries()
        .iter()
        .map(|e| e.original_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Original Name".len());

    println!();
    println!(
        "{}    {}",
        format!("{:<width$}", "Original Name").bold(),
        "New Name".bold()
    );
    println!("{}", "-".repeat(width + 4 + 30).dimmed());
    for entry in plan.entries() {
        match entry.action {
            PlanAction::Rename => println!(
                "{:<width$} -> {}",
                entry.original_name,
                entry.destination_name.green()
            ),
            action => println!(
                "{:<width$}    {}",
                entry.original_name,
                skip_label(action, entry.note.as_deref()).dimmed()
            ),
        }
    }
}

fn skip_label(action: PlanAction, note: Option<&str>) -> String {
    let reason = match action {
        PlanAction::SkipNoDate => "no date found",
        PlanAction::SkipAlreadyFormatted => "already formatted",
        PlanAction::SkipUnresolvableCollision => "no free name",
        PlanAction::SkipUnreadable => "unreadable",
        PlanAction::Rename => "",
    };
    match note {
        Some(note) if action == PlanAction::SkipUnreadable => format!("[{}: {}]", reason, note),
        _ => format!("[{}]", reason),
    }
}
