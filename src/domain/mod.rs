//! Domain layer: models, the phase-merge logic, error taxonomy, and
//! the port trait for the backend API.

pub mod error;
pub mod merge;
pub mod models;
pub mod ports;

pub use error::{ApiError, ApiResult};
pub use merge::{has_deep_data, merge_lots, should_auto_analyze, MergedLot};
pub use ports::TenderApi;
