use crate::backup::{BackupService, DirectoryBackup};
use crate::collision::DestinationRegistry;
use crate::config::AppConfig;
use crate::date::DateExtractor;
use crate::error::Error;
use crate::executor::{CommitReport, EntryOutcome, ExecutionMode, Executor};
use crate::model::{BatchSummary, Plan, PlanAction, SourceFile};
use crate::planner;
use crate::progress::{ConfirmationGate, ProgressReporter};
use crate::scanner;
use crate::text_source::{self, DocumentTextSource, TextSource};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Per-invocation switches, as opposed to `AppConfig` settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub mode: ExecutionMode,
}

/// Everything known about a batch before anything is mutated.
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub directory: PathBuf,
    pub files: Vec<SourceFile>,
    pub plan: Plan,
    pub extract_duration: Duration,
}

impl PreparedBatch {
    /// Move every file to the state its plan entry ended in. A dry run
    /// leaves would-be renames at `Planned`.
    pub fn record_outcomes(&mut self, outcomes: &[EntryOutcome], mode: ExecutionMode) {
        for (file, outcome) in self.files.iter_mut().zip(outcomes) {
            if mode == ExecutionMode::DryRun && outcome.action == PlanAction::Rename {
                continue;
            }
            file.finish(outcome.status, outcome.error.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Completed,
    /// The confirmation gate said no; nothing was touched.
    Cancelled,
    /// Every file was skipped at planning time, so no backup was taken.
    NothingToRename,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub status: BatchStatus,
    pub batch: PreparedBatch,
    pub report: CommitReport,
}

impl BatchOutcome {
    pub fn summary(&self) -> BatchSummary {
        self.report.summary
    }
}

pub struct RenameEngine {
    config: AppConfig,
    extractor: DateExtractor,
    text_source: Arc<dyn TextSource>,
    backup: Box<dyn BackupService>,
}

impl RenameEngine {
    pub fn new(config: AppConfig) -> Self {
        let text_source = Arc::new(DocumentTextSource::new(config.max_pages));
        let backup = Box::new(DirectoryBackup::new(config.backup_reuse_window()));
        Self {
            config,
            extractor: DateExtractor::new(),
            text_source,
            backup,
        }
    }

    pub fn with_text_source(mut self, source: Arc<dyn TextSource>) -> Self {
        self.text_source = source;
        self
    }

    pub fn with_backup_service(mut self, backup: Box<dyn BackupService>) -> Self {
        self.backup = backup;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Discovery, parallel extraction and planning. Read-only.
    pub fn prepare(&self, path: &Path, reporter: &dyn ProgressReporter) -> Result<PreparedBatch, Error> {
        // Phase 1: Discover
        let discovery = scanner::discover(path, &self.config)?;
        reporter.on_discovery_complete(discovery.files.len(), &discovery.directory);

        // Phase 2: Extract (parallel)
        info!("Extracting dates from {} files...", discovery.files.len());
        let extract_start = Instant::now();
        let mut files = self.extract_all(discovery.files, reporter)?;
        let extract_duration = extract_start.elapsed();
        let dated = files.iter().filter(|f| f.resolved_date.is_some()).count();
        reporter.on_extract_complete(dated, extract_duration.as_secs_f64());
        debug!(
            "Extraction completed in {:.2}s, {} of {} files dated",
            extract_duration.as_secs_f64(),
            dated,
            files.len(),
        );

        // Phase 3: Plan (single-threaded, after every worker has joined)
        let registry =
            DestinationRegistry::from_directory(&discovery.directory, self.config.case_insensitive_names)
                .map_err(|e| Error::discovery(&discovery.directory, e.to_string()))?;
        let plan = planner::plan(&files, registry);
        files.iter_mut().for_each(SourceFile::mark_planned);
        reporter.on_plan_ready(&plan);

        Ok(PreparedBatch {
            directory: discovery.directory,
            files,
            plan,
            extract_duration,
        })
    }

    /// Back up (commit mode only) and apply the plan of a prepared batch.
    pub fn execute(
        &self,
        batch: &PreparedBatch,
        mode: ExecutionMode,
        reporter: &dyn ProgressReporter,
    ) -> Result<CommitReport, Error> {
        let mut backup_dir = None;
        let backup_completed = match mode {
            ExecutionMode::DryRun => false,
            ExecutionMode::Commit if !batch.plan.has_renames() => true,
            ExecutionMode::Commit => {
                info!("Backing up {} files...", batch.files.len());
                let paths: Vec<PathBuf> = batch.files.iter().map(|f| f.path.clone()).collect();
                let receipt = self.backup.backup_all(&batch.directory, &paths)?;
                reporter.on_backup_complete(&receipt.backup_dir, receipt.files, receipt.reused);
                backup_dir = Some(receipt.backup_dir);
                true
            }
        };

        let mut report = Executor::new(mode).commit(&batch.plan, backup_completed, reporter)?;
        report.backup_dir = backup_dir;
        Ok(report)
    }

    /// Prepare, ask the gate, then execute.
    pub fn run(
        &self,
        path: &Path,
        options: &RunOptions,
        gate: &dyn ConfirmationGate,
        reporter: &dyn ProgressReporter,
    ) -> Result<BatchOutcome, Error> {
        let mut batch = self.prepare(path, reporter)?;

        if !batch.plan.has_renames() {
            info!("Nothing to rename");
            let report = Executor::new(ExecutionMode::DryRun).commit(&batch.plan, false, reporter)?;
            batch.record_outcomes(&report.outcomes, ExecutionMode::DryRun);
            return Ok(BatchOutcome {
                status: BatchStatus::NothingToRename,
                batch,
                report,
            });
        }

        if options.mode == ExecutionMode::Commit && !gate.confirm_proceed(&batch.plan) {
            info!("Operation cancelled by user");
            return Ok(BatchOutcome {
                status: BatchStatus::Cancelled,
                batch,
                report: CommitReport::default(),
            });
        }

        let report = self.execute(&batch, options.mode, reporter)?;
        batch.record_outcomes(&report.outcomes, options.mode);
        Ok(BatchOutcome {
            status: BatchStatus::Completed,
            batch,
            report,
        })
    }

    fn extract_all(
        &self,
        paths: Vec<PathBuf>,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<SourceFile>, Error> {
        let total = paths.len();
        reporter.on_extract_start(total);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("extract-{}", i))
            .build()?;

        let done = AtomicUsize::new(0);
        let timeout = self.config.extraction_timeout();

        // Each worker owns exactly one SourceFile; results keep discovery order.
        let files = pool.install(|| {
            paths
                .into_par_iter()
                .map(|path| {
                    let file = self.extract_one(path, timeout);
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    reporter.on_extract_progress(n, total);
                    file
                })
                .collect::<Vec<_>>()
        });
        Ok(files)
    }

    fn extract_one(&self, path: PathBuf, timeout: Option<Duration>) -> SourceFile {
        let mut file = SourceFile::discovered(path);
        if file.normalized.already_formatted {
            debug!("{} is already formatted, not reading it", file.original_name);
            return file;
        }

        match text_source::extract_with_timeout(self.text_source.clone(), file.path.clone(), timeout) {
            Ok(pages) => {
                let date = self.extractor.extract_from_pages(&pages);
                file.set_text(pages.join("\n"));
                file.set_date(date);
                match date {
                    Some(date) => debug!("{}: {}", file.original_name, date),
                    None => debug!("{}: no date found", file.original_name),
                }
            }
            Err(e) => {
                warn!("Error processing {}: {}", file.path.display(), e);
                file.fail(e);
            }
        }
        file
    }
}
