pub mod backup;
pub mod collision;
pub mod config;
pub mod date;
pub mod engine;
pub mod error;
pub mod executor;
pub mod model;
pub mod name;
pub mod planner;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod text_source;

pub use config::AppConfig;
pub use engine::{BatchOutcome, BatchStatus, PreparedBatch, RenameEngine, RunOptions};
pub use error::{Error, ExtractionError};
pub use executor::{CommitReport, ExecutionMode, Executor};
pub use model::{BatchSummary, FileStatus, Plan, PlanAction, RenamePlanEntry, SourceFile};
pub use progress::{AutoConfirm, ConfirmationGate, ProgressReporter, SilentReporter};
