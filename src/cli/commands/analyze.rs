//! `tenderctl analyze` — trigger deep analysis with live progress.

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::models::Tender;
use crate::services::analysis::{AnalysisEvent, AnalysisRunner, StartOutcome};
use crate::services::SyncEngine;

use super::AppContext;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Tender id
    pub id: Uuid,
}

pub async fn execute(args: AnalyzeArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let runner = AnalysisRunner::new(Arc::clone(&ctx.engine));
    let tender = run_with_progress(&runner, args.id, json_mode).await?;

    match tender {
        Some(tender) => {
            if json_mode {
                println!("{}", serde_json::to_string_pretty(&tender)?);
            } else {
                println!("Analysis complete for {}", tender.label());
            }
            Ok(())
        }
        None => bail!("analysis run ended without a result"),
    }
}

const PROGRESS_TEMPLATE: &str = "{bar:40.cyan/blue} {pos:>3}% {msg}";

/// Drive one analysis run, rendering its simulated progress, and hand
/// back the updated tender snapshot on success.
pub(crate) async fn run_with_progress(
    runner: &AnalysisRunner,
    id: Uuid,
    json_mode: bool,
) -> Result<Option<Tender>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<AnalysisEvent>();

    match runner.start(id, tx).await {
        StartOutcome::Started => {}
        StartOutcome::Busy => bail!("an analysis is already in flight for this session"),
        StartOutcome::NotEligible => return Ok(None),
    }

    let bar = if json_mode {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_TEMPLATE)
                .expect("valid progress template")
                .progress_chars("█▓▒░ "),
        );
        bar
    };

    while let Some(event) = rx.recv().await {
        match event {
            AnalysisEvent::Started { .. } => {}
            AnalysisEvent::Progress {
                progress, message, ..
            } => {
                bar.set_position(u64::from(progress));
                bar.set_message(message);
            }
            AnalysisEvent::Completed { tender, .. } => {
                bar.finish_with_message("Complete");
                return Ok(Some(*tender));
            }
            AnalysisEvent::Failed { error, .. } => {
                bar.abandon_with_message("failed");
                return Err(error.into());
            }
        }
    }

    Ok(None)
}

/// Same as [`run_with_progress`], but only when the record qualifies
/// for the automatic phase-2 kick-off.
pub(crate) async fn auto_run_with_progress(
    engine: &Arc<SyncEngine>,
    tender: &Tender,
    json_mode: bool,
) -> Result<Option<Tender>> {
    let runner = AnalysisRunner::new(Arc::clone(engine));
    if !crate::domain::merge::should_auto_analyze(tender) {
        return Ok(None);
    }
    if !json_mode {
        println!("Deep analysis has not run yet — starting it now.");
    }
    run_with_progress(&runner, tender.id, json_mode).await
}
