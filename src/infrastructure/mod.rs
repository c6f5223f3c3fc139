//! Infrastructure layer: HTTP client for the backend and config loading.

pub mod api;
pub mod config;

pub use api::{ApiClient, RetryPolicy};
pub use config::{ConfigError, ConfigLoader};
