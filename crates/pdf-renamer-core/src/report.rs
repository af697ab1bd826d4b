use crate::error::Error;
use crate::executor::EntryOutcome;
use crate::model::{FileStatus, Plan, PlanAction};
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    source: String,
    original_name: &'a str,
    destination: &'a str,
    action: PlanAction,
    date: Option<String>,
    status: Option<FileStatus>,
    error: Option<&'a str>,
}

/// Write one CSV row per plan entry. `outcomes` is matched to the plan by
/// position and may be empty when nothing was executed.
pub fn write_to<W: io::Write>(writer: W, plan: &Plan, outcomes: &[EntryOutcome]) -> Result<usize, Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (idx, entry) in plan.entries().iter().enumerate() {
        let outcome = outcomes.get(idx);
        wtr.serialize(ReportRow {
            source: entry.source_path.to_string_lossy().into_owned(),
            original_name: &entry.original_name,
            destination: &entry.destination_name,
            action: entry.action,
            date: entry.date.map(|d| d.format("%Y-%m-%d").to_string()),
            status: outcome.map(|o| o.status),
            error: outcome
                .and_then(|o| o.error.as_deref())
                .or(entry.note.as_deref()),
        })?;
    }
    wtr.flush()?;
    Ok(plan.len())
}

pub fn write_csv(path: &Path, plan: &Plan, outcomes: &[EntryOutcome]) -> Result<usize, Error> {
    let file = std::fs::File::create(path)?;
    let rows = write_to(file, plan, outcomes)?;
    info!("Wrote {} rows to {}", rows, path.display());
    Ok(rows)
}
