use crate::collision::{CollisionResolver, DestinationRegistry};
use crate::model::{FileStatus, Plan, PlanAction, RenamePlanEntry, SourceFile};
use tracing::{debug, info};

/// Build the plan for a batch of already-extracted files, in input order.
///
/// Nothing on disk is touched. `registry` must already hold every name that
/// exists in the destination directory.
pub fn plan(files: &[SourceFile], registry: DestinationRegistry) -> Plan {
    let mut resolver = CollisionResolver::new(registry);
    let mut entries = Vec::with_capacity(files.len());

    for file in files {
        let entry = plan_file(file, &mut resolver);
        debug!(
            "{} -> {} ({})",
            entry.original_name, entry.destination_name, entry.action
        );
        entries.push(entry);
    }

    let plan = Plan::from_entries(entries);
    info!(
        "Planned {} files: {} to rename, {} already formatted, {} without date",
        plan.len(),
        plan.count(PlanAction::Rename),
        plan.count(PlanAction::SkipAlreadyFormatted),
        plan.count(PlanAction::SkipNoDate),
    );
    plan
}

fn plan_file(file: &SourceFile, resolver: &mut CollisionResolver) -> RenamePlanEntry {
    let skip = |action: PlanAction, note: Option<String>| RenamePlanEntry {
        source_path: file.path.clone(),
        original_name: file.original_name.clone(),
        destination_name: file.original_name.clone(),
        action,
        date: file.resolved_date,
        note,
    };

    if file.normalized.already_formatted {
        return skip(PlanAction::SkipAlreadyFormatted, None);
    }
    if file.status == FileStatus::Failed {
        return skip(PlanAction::SkipUnreadable, file.error.clone());
    }
    let Some(date) = file.resolved_date else {
        return skip(PlanAction::SkipNoDate, None);
    };

    let normalized = &file.normalized;
    match resolver.resolve_one(date, &normalized.canonical_base, &normalized.extension) {
        Some(destination_name) => RenamePlanEntry {
            source_path: file.path.clone(),
            original_name: file.original_name.clone(),
            destination_name,
            action: PlanAction::Rename,
            date: Some(date),
            note: None,
        },
        None => skip(
            PlanAction::SkipUnresolvableCollision,
            Some(format!("no free name for {}", normalized.candidate(date))),
        ),
    }
}
