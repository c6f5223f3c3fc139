//! CLI command implementations.

pub mod analyze;
pub mod ask;
pub mod health;
pub mod list;
pub mod scraper;
pub mod show;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::domain::models::Config;
use crate::infrastructure::{ApiClient, ConfigLoader};
use crate::services::SyncEngine;

/// Everything a command needs: the resolved config and the shared
/// sync engine (cache + mutation gateway).
pub struct AppContext {
    pub config: Config,
    pub engine: Arc<SyncEngine>,
}

/// Load config, build the API client, and wire up the engine.
pub fn build_context(config_file: Option<&Path>) -> Result<AppContext> {
    let config = match config_file {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let client = ApiClient::new(&config.api, &config.retry)?;
    let engine = Arc::new(SyncEngine::new(Arc::new(client), config.polling.clone()));
    Ok(AppContext { config, engine })
}
