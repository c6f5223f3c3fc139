//! Tenderctl — terminal client for the tender document-intelligence
//! platform.
//!
//! The backend scrapes public tender portals, extracts metadata in two
//! asynchronous phases, and answers questions over the documents. This
//! crate is the client side of that pipeline: it reconciles the
//! partial results into one provenance-tracked record and keeps a
//! terminal UI consistent with long-running server jobs under polling.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): provenance data model, the phase
//!   merge, error taxonomy, and the API port trait
//! - **Service Layer** (`services`): resource cache with coalescing
//!   and invalidation, polling orchestrator, analysis progress state
//!   machine, run-log aggregator
//! - **Infrastructure Layer** (`infrastructure`): reqwest API client
//!   with retry, figment config loading
//! - **CLI Layer** (`cli`): clap commands and terminal rendering

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::error::{ApiError, ApiResult};
pub use domain::merge::{has_deep_data, merge_lots, should_auto_analyze, MergedLot};
pub use domain::models::{
    AvisMetadata, Config, Document, Health, Lot, LotDeepData, ScraperStatus, Tender, TenderPage,
    TenderQuery, TenderStatus, TrackedValue, UniversalMetadata,
};
pub use domain::ports::TenderApi;
pub use infrastructure::{ApiClient, ConfigLoader};
pub use services::{AnalysisEvent, AnalysisRunner, RunLog, SyncEngine, SyncEvent};
