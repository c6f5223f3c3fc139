//! Configuration loading (figment: defaults, YAML files, env vars).

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
