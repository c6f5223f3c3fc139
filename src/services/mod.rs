//! Service layer: the resource cache, the polling orchestrator, the
//! analysis progress machine, and the run log aggregator.

pub mod analysis;
pub mod cache;
pub mod run_log;
pub mod sync;

pub use analysis::{AnalysisEvent, AnalysisRunner, StartOutcome};
pub use cache::{CachedResult, ResourceCell};
pub use run_log::{LogEntry, LogLevel, RunLog};
pub use sync::{PollPlan, SyncEngine, SyncEvent};
