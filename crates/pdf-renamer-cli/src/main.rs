mod commands;
mod logging;
mod progress;
mod prompt;

use std::path::Path;
use std::process;

use anyhow::Context;
use clap::Parser;
use colored::*;
use commands::Cli;
use dotenv::dotenv;
use pdf_renamer_core::{
    report, AppConfig, AutoConfirm, BatchOutcome, BatchStatus, BatchSummary, ConfirmationGate,
    ExecutionMode, ProgressReporter, RenameEngine, RunOptions,
};
use progress::CliReporter;
use prompt::PromptGate;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let args = Cli::parse();

    let _guard = logging::init_logger();

    let mut config = match pdf_renamer_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };
    apply_overrides(&mut config, &args);

    let engine = RenameEngine::new(config);
    let reporter = CliReporter::new();
    let gate: Box<dyn ConfirmationGate> = if args.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(PromptGate)
    };

    if let Err(err) = run(&engine, &args, gate.as_ref(), &reporter) {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn apply_overrides(config: &mut AppConfig, args: &Cli) {
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(timeout) = args.timeout {
        config.extraction_timeout_secs = timeout;
    }
    if args.fresh_backup {
        config.backup_reuse_window_secs = 0;
    }
}

/// Only batch-fatal errors come back as `Err`; everything else exits 0.
fn run(
    engine: &RenameEngine,
    args: &Cli,
    gate: &dyn ConfirmationGate,
    reporter: &dyn ProgressReporter,
) -> anyhow::Result<BatchStatus> {
    let options = RunOptions {
        mode: if args.dry_run {
            ExecutionMode::DryRun
        } else {
            ExecutionMode::Commit
        },
    };

    let outcome = engine
        .run(&args.path, &options, gate, reporter)
        .with_context(|| format!("processing {}", args.path.display()))?;

    match outcome.status {
        BatchStatus::Cancelled => {
            println!("{}", "Operation cancelled.".yellow());
            return Ok(outcome.status);
        }
        BatchStatus::NothingToRename => println!("\n{}", "Nothing to rename.".yellow()),
        BatchStatus::Completed => {}
    }

    finish_batch(&outcome, options.mode, args.report.as_deref());
    Ok(outcome.status)
}

/// Print the summary, then write the CSV report if one was asked for. A
/// report that cannot be written is logged; the batch itself already ran.
fn finish_batch(outcome: &BatchOutcome, mode: ExecutionMode, report_path: Option<&Path>) -> Option<usize> {
    print_summary(&outcome.summary(), mode);
    if let Some(dir) = &outcome.report.backup_dir {
        info!("Originals are kept in {}", dir.display());
    }

    let path = report_path?;
    match report::write_csv(path, &outcome.batch.plan, &outcome.report.outcomes) {
        Ok(rows) => Some(rows),
        Err(e) => {
            error!(
                "Could not write report to {}: {:#}",
                path.display(),
                anyhow::Error::new(e)
            );
            None
        }
    }
}

fn print_summary(summary: &BatchSummary, mode: ExecutionMode) {
    let renamed_label = match mode {
        ExecutionMode::DryRun => "Would rename",
        ExecutionMode::Commit => "Renamed",
    };

    println!();
    println!("{}", "Summary".bold());
    println!("  Processed:         {}", summary.processed);
    println!(
        "  {:<18} {}",
        format!("{}:", renamed_label),
        summary.renamed.to_string().green()
    );
    println!(
        "  Already formatted: {}",
        summary.skipped_already_formatted.to_string().cyan()
    );
    println!(
        "  No date found:     {}",
        summary.skipped_no_date.to_string().yellow()
    );
    let errors = summary.errors.to_string();
    println!(
        "  Errors:            {}",
        if summary.errors > 0 { errors.red() } else { errors.normal() }
    );
}
