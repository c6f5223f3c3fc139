//! `tenderctl health` — one-shot backend probe.

use anyhow::Result;
use console::style;

use crate::cli::display::provenance::offline_banner;

use super::AppContext;

pub async fn execute(ctx: &AppContext, json_mode: bool) -> Result<()> {
    match ctx.engine.health().await {
        Ok(health) => {
            if json_mode {
                println!("{}", serde_json::to_string_pretty(&*health)?);
            } else {
                println!(
                    "{} backend {} (version {})",
                    style("✓").green(),
                    health.status,
                    health.version
                );
            }
            Ok(())
        }
        Err(err) => {
            if json_mode {
                println!(
                    "{}",
                    serde_json::json!({ "success": false, "error": err.to_string() })
                );
            } else {
                println!("{}", offline_banner());
            }
            Err(err.into())
        }
    }
}
