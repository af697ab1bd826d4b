use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

use pdf_renamer_core::backup::{BackupReceipt, BackupService};
use pdf_renamer_core::text_source::{DocumentTextSource, TextSource};
use pdf_renamer_core::{
    AppConfig, AutoConfirm, BatchStatus, ConfirmationGate, Error, ExecutionMode, ExtractionError,
    FileStatus, Plan, PlanAction, ProgressReporter, RenameEngine, RunOptions, SilentReporter,
};

fn text_config() -> AppConfig {
    AppConfig {
        extensions: vec!["txt".to_string()],
        workers: 2,
        backup_reuse_window_secs: 0,
        case_insensitive_names: false,
        ..AppConfig::default()
    }
}

fn commit() -> RunOptions {
    RunOptions {
        mode: ExecutionMode::Commit,
    }
}

fn dry_run() -> RunOptions {
    RunOptions {
        mode: ExecutionMode::DryRun,
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .flatten()
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn backup_dirs(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_dir()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("backup_"))
                    .unwrap_or(false)
        })
        .collect()
}

/// Layout:
///   root/
///     statement(1).txt   "Statement date 2023-10-25"
///     statement(2).txt   "Period ending 25/10/2023"
///     invoice.txt        "Printed 12/01/2023 ... Invoice date: January 5, 2023"
///     notes.txt          "no date in here"
///     2022-01-01_old.txt "2022-01-01"
///     image.png          not part of the batch
fn create_test_tree(root: &Path) {
    fs::create_dir_all(root).unwrap();
    fs::write(root.join("statement(1).txt"), "Statement date 2023-10-25").unwrap();
    fs::write(root.join("statement(2).txt"), "Period ending 25/10/2023").unwrap();
    fs::write(
        root.join("invoice.txt"),
        "Printed 12/01/2023\nInvoice date: January 5, 2023",
    )
    .unwrap();
    fs::write(root.join("notes.txt"), "no date in here").unwrap();
    fs::write(root.join("2022-01-01_old.txt"), "2022-01-01").unwrap();
    fs::write(root.join("image.png"), [0x89u8, 0x50, 0x4E, 0x47]).unwrap();
}

#[test]
fn test_full_commit_pipeline() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    create_test_tree(&root);

    let engine = RenameEngine::new(text_config());
    let outcome = engine
        .run(&root, &commit(), &AutoConfirm, &SilentReporter)
        .unwrap();

    assert_eq!(outcome.status, BatchStatus::Completed);
    let summary = outcome.summary();
    assert_eq!(summary.processed, 5);
    assert_eq!(summary.renamed, 3);
    assert_eq!(summary.skipped_already_formatted, 1);
    assert_eq!(summary.skipped_no_date, 1);
    assert_eq!(summary.errors, 0);
    assert!(summary.is_balanced());

    assert_eq!(
        file_names(&root),
        vec![
            "2022-01-01_old.txt",
            "2023-01-05_invoice.txt",
            "2023-10-25_statement(1).txt",
            "2023-10-25_statement.txt",
            "image.png",
            "notes.txt",
        ]
    );
    // Discovery order decides who gets the bare name.
    assert_eq!(
        fs::read_to_string(root.join("2023-10-25_statement.txt")).unwrap(),
        "Statement date 2023-10-25"
    );
    assert_eq!(
        fs::read_to_string(root.join("2023-10-25_statement(1).txt")).unwrap(),
        "Period ending 25/10/2023"
    );
}

#[test]
fn test_backup_holds_identical_copies_of_the_batch() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    create_test_tree(&root);

    let originals: Vec<(String, Vec<u8>)> = file_names(&root)
        .into_iter()
        .filter(|n| n.ends_with(".txt"))
        .map(|n| {
            let bytes = fs::read(root.join(&n)).unwrap();
            (n, bytes)
        })
        .collect();

    let engine = RenameEngine::new(text_config());
    let outcome = engine
        .run(&root, &commit(), &AutoConfirm, &SilentReporter)
        .unwrap();

    let backup_dir = outcome.report.backup_dir.clone().unwrap();
    assert_eq!(backup_dirs(&root), vec![backup_dir.clone()]);
    assert_eq!(file_names(&backup_dir).len(), originals.len());
    for (name, bytes) in &originals {
        assert_eq!(&fs::read(backup_dir.join(name)).unwrap(), bytes, "{}", name);
    }
}

#[test]
fn test_rerun_after_commit_is_all_already_formatted() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("statement(1).txt"), "2023-10-25").unwrap();
    fs::write(root.join("statement(2).txt"), "2023-10-25").unwrap();
    fs::write(root.join("bill.txt"), "12 March 2021").unwrap();

    let engine = RenameEngine::new(text_config());
    engine
        .run(&root, &commit(), &AutoConfirm, &SilentReporter)
        .unwrap();

    let batch = engine.prepare(&root, &SilentReporter).unwrap();
    assert_eq!(batch.plan.len(), 3);
    assert!(batch
        .plan
        .entries()
        .iter()
        .all(|e| e.action == PlanAction::SkipAlreadyFormatted));

    let rerun = engine
        .run(&root, &dry_run(), &AutoConfirm, &SilentReporter)
        .unwrap();
    assert_eq!(rerun.status, BatchStatus::NothingToRename);
    assert_eq!(rerun.summary().skipped_already_formatted, 3);
}

#[test]
fn test_dry_run_changes_nothing() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    create_test_tree(&root);
    let before = file_names(&root);

    let engine = RenameEngine::new(text_config());
    let outcome = engine
        .run(&root, &dry_run(), &AutoConfirm, &SilentReporter)
        .unwrap();

    assert_eq!(outcome.status, BatchStatus::Completed);
    assert_eq!(outcome.summary().renamed, 3);
    assert!(outcome.report.backup_dir.is_none());
    assert_eq!(file_names(&root), before);
    assert!(backup_dirs(&root).is_empty());
}

#[test]
fn test_existing_entry_in_directory_is_never_targeted() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("invoice.txt"), "2023-10-25").unwrap();
    // A directory is never part of the batch but still owns its name.
    fs::create_dir(root.join("2023-10-25_invoice.txt")).unwrap();

    let engine = RenameEngine::new(text_config());
    let batch = engine.prepare(&root, &SilentReporter).unwrap();
    assert_eq!(batch.plan.entries()[0].destination_name, "2023-10-25_invoice(1).txt");
}

#[test]
fn test_plan_destinations_are_pairwise_distinct() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    fs::create_dir_all(&root).unwrap();
    for i in 0..20 {
        let name = if i % 2 == 0 {
            format!("report({}).txt", i + 1)
        } else {
            format!("report ({}).txt", i + 1)
        };
        fs::write(root.join(name), "Dated 1 June 2022").unwrap();
    }
    fs::write(root.join("2022-06-01_report(3).txt"), "x").unwrap();

    let engine = RenameEngine::new(text_config());
    let batch = engine.prepare(&root, &SilentReporter).unwrap();
    let destinations: Vec<&str> = batch
        .plan
        .entries()
        .iter()
        .map(|e| e.destination_name.as_str())
        .collect();
    let unique: HashSet<&str> = destinations.iter().copied().collect();
    assert_eq!(unique.len(), destinations.len());

    let renamed: Vec<&str> = batch
        .plan
        .renames()
        .map(|e| e.destination_name.as_str())
        .collect();
    assert_eq!(renamed.len(), 20);
    assert!(!renamed.contains(&"2022-06-01_report(3).txt"));
}

struct FailingBackup;

impl BackupService for FailingBackup {
    fn backup_all(&self, _directory: &Path, _files: &[PathBuf]) -> Result<BackupReceipt, Error> {
        Err(Error::Backup("disk full".to_string()))
    }
}

#[test]
fn test_backup_failure_aborts_before_any_rename() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    create_test_tree(&root);
    let before = file_names(&root);

    let engine = RenameEngine::new(text_config()).with_backup_service(Box::new(FailingBackup));
    let result = engine.run(&root, &commit(), &AutoConfirm, &SilentReporter);

    assert!(matches!(result, Err(Error::Backup(_))));
    assert_eq!(file_names(&root), before);
}

struct Decline;

impl ConfirmationGate for Decline {
    fn confirm_proceed(&self, plan: &Plan) -> bool {
        assert!(plan.has_renames());
        false
    }
}

#[test]
fn test_declined_confirmation_leaves_everything() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    create_test_tree(&root);
    let before = file_names(&root);

    let engine = RenameEngine::new(text_config());
    let outcome = engine
        .run(&root, &commit(), &Decline, &SilentReporter)
        .unwrap();

    assert_eq!(outcome.status, BatchStatus::Cancelled);
    assert_eq!(file_names(&root), before);
    assert!(backup_dirs(&root).is_empty());
}

/// Fails for any file whose name contains "corrupt".
struct FlakySource;

impl TextSource for FlakySource {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractionError> {
        let name = path.file_name().unwrap().to_string_lossy();
        if name.contains("corrupt") {
            return Err(ExtractionError::PdfParsing("broken xref table".to_string()));
        }
        DocumentTextSource::new(0).extract_pages(path)
    }
}

#[test]
fn test_unreadable_file_is_an_error_not_an_abort() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a_corrupt.txt"), "2023-10-25").unwrap();
    fs::write(root.join("b_fine.txt"), "2023-10-25").unwrap();

    let engine = RenameEngine::new(text_config()).with_text_source(Arc::new(FlakySource));
    let outcome = engine
        .run(&root, &commit(), &AutoConfirm, &SilentReporter)
        .unwrap();

    let summary = outcome.summary();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.renamed, 1);
    assert!(summary.is_balanced());

    assert_eq!(outcome.batch.files[0].status, FileStatus::Failed);
    assert_eq!(outcome.batch.plan.entries()[0].action, PlanAction::SkipUnreadable);
    assert_eq!(outcome.report.outcomes[0].status, FileStatus::Failed);
    assert!(root.join("a_corrupt.txt").exists());
    assert!(root.join("2023-10-25_b_fine.txt").exists());
}

#[test]
fn test_only_undated_files_needs_no_backup() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.txt"), "nothing").unwrap();
    fs::write(root.join("b.txt"), "31/02/2023 is not a date").unwrap();

    let engine = RenameEngine::new(text_config());
    let outcome = engine
        .run(&root, &commit(), &AutoConfirm, &SilentReporter)
        .unwrap();

    assert_eq!(outcome.status, BatchStatus::NothingToRename);
    assert_eq!(outcome.summary().skipped_no_date, 2);
    assert!(backup_dirs(&root).is_empty());
}

#[test]
fn test_single_file_mode() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    create_test_tree(&root);

    let engine = RenameEngine::new(text_config());
    let outcome = engine
        .run(&root.join("invoice.txt"), &commit(), &AutoConfirm, &SilentReporter)
        .unwrap();

    assert_eq!(outcome.summary().processed, 1);
    assert_eq!(outcome.summary().renamed, 1);
    assert!(root.join("2023-01-05_invoice.txt").exists());
    assert!(root.join("statement(1).txt").exists());
    let backup = outcome.report.backup_dir.unwrap();
    assert_eq!(file_names(&backup), vec!["invoice.txt"]);
}

#[test]
fn test_missing_path_is_fatal() {
    let tmp = tempdir().unwrap();
    let engine = RenameEngine::new(text_config());
    let result = engine.run(
        &tmp.path().join("does-not-exist"),
        &commit(),
        &AutoConfirm,
        &SilentReporter,
    );
    assert!(matches!(result, Err(Error::Discovery { .. })));
}

#[test]
fn test_empty_directory() {
    let tmp = tempdir().unwrap();
    let engine = RenameEngine::new(text_config());
    let outcome = engine
        .run(tmp.path(), &commit(), &AutoConfirm, &SilentReporter)
        .unwrap();
    assert_eq!(outcome.status, BatchStatus::NothingToRename);
    assert_eq!(outcome.summary().processed, 0);
}

fn status_of(outcome: &pdf_renamer_core::BatchOutcome, name: &str) -> FileStatus {
    outcome
        .batch
        .files
        .iter()
        .find(|f| f.original_name == name)
        .map(|f| f.status)
        .unwrap()
}

#[test]
fn test_files_end_in_terminal_states_after_commit() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    create_test_tree(&root);

    let engine = RenameEngine::new(text_config());
    let outcome = engine
        .run(&root, &commit(), &AutoConfirm, &SilentReporter)
        .unwrap();

    assert!(outcome.batch.files.iter().all(|f| f.status.is_terminal()));
    assert_eq!(status_of(&outcome, "statement(1).txt"), FileStatus::Renamed);
    assert_eq!(status_of(&outcome, "notes.txt"), FileStatus::SkippedNoDate);
    assert_eq!(
        status_of(&outcome, "2022-01-01_old.txt"),
        FileStatus::SkippedAlreadyFormatted
    );
}

#[test]
fn test_dry_run_leaves_renames_planned() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    create_test_tree(&root);

    let engine = RenameEngine::new(text_config());
    let prepared = engine.prepare(&root, &SilentReporter).unwrap();
    assert!(prepared
        .files
        .iter()
        .all(|f| f.status == FileStatus::Planned));

    let outcome = engine
        .run(&root, &dry_run(), &AutoConfirm, &SilentReporter)
        .unwrap();
    assert_eq!(status_of(&outcome, "invoice.txt"), FileStatus::Planned);
    assert_eq!(status_of(&outcome, "notes.txt"), FileStatus::SkippedNoDate);
}

/// Records the order in which the plan hook and the gate fire.
#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl ProgressReporter for EventLog {
    fn on_plan_ready(&self, plan: &Plan) {
        self.push(format!("plan:{}", plan.len()));
    }
}

impl ConfirmationGate for EventLog {
    fn confirm_proceed(&self, _plan: &Plan) -> bool {
        self.push("gate".to_string());
        false
    }
}

#[test]
fn test_plan_is_shown_before_confirmation() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("docs");
    create_test_tree(&root);

    let log = EventLog::default();
    let engine = RenameEngine::new(text_config());
    let outcome = engine.run(&root, &commit(), &log, &log).unwrap();

    assert_eq!(outcome.status, BatchStatus::Cancelled);
    assert_eq!(log.events(), vec!["plan:5".to_string(), "gate".to_string()]);
}
