//! `tenderctl watch` — live dashboard over the polling loop.
//!
//! Runs the sync engine's cadences (health 10s, list 30s, scraper 2s)
//! and prints a line per update. The offline banner appears when the
//! health probe fails; the other polls keep their own schedules
//! regardless.

use anyhow::Result;
use clap::Args;
use console::style;
use tokio::sync::{mpsc, watch};

use crate::cli::display::provenance::offline_banner;
use crate::services::sync::{PollPlan, SyncEvent};

use super::list::ListArgs;
use super::AppContext;

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub filter: ListArgs,
}

pub async fn execute(args: WatchArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let query = args.filter.to_query()?;
    ctx.engine.set_list_query(query);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SyncEvent>();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let engine = ctx.engine.clone();
    let poller = tokio::spawn(async move {
        engine
            .run(PollPlan::dashboard(), event_tx, shutdown_rx)
            .await;
    });

    if !json_mode {
        println!("Watching tenders and scraper (ctrl-c to stop)");
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                let _ = shutdown_tx.send(true);
                break;
            }
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                render_event(&event, json_mode);
            }
        }
    }

    let _ = poller.await;
    Ok(())
}

fn render_event(event: &SyncEvent, json_mode: bool) {
    if json_mode {
        let value = match event {
            SyncEvent::OnlineChanged(online) => {
                serde_json::json!({"event": "online_changed", "online": online})
            }
            SyncEvent::HealthUpdated(health) => {
                serde_json::json!({"event": "health", "version": health.version})
            }
            SyncEvent::TenderListUpdated(page) => {
                serde_json::json!({"event": "tender_list", "total": page.total, "page": page.page})
            }
            SyncEvent::TenderListFailed(err) => {
                serde_json::json!({"event": "tender_list_failed", "error": err.to_string()})
            }
            SyncEvent::ScraperStatusUpdated(status) => serde_json::json!({
                "event": "scraper_status",
                "is_running": status.is_running,
                "phase": status.current_phase,
            }),
            SyncEvent::ScraperStatusFailed(err) => {
                serde_json::json!({"event": "scraper_status_failed", "error": err.to_string()})
            }
        };
        println!("{value}");
        return;
    }

    match event {
        SyncEvent::OnlineChanged(false) => println!("{}", offline_banner()),
        SyncEvent::OnlineChanged(true) => {
            println!("{}", style("✓ backend reachable again").green());
        }
        SyncEvent::HealthUpdated(_) => {}
        SyncEvent::TenderListUpdated(page) => {
            println!(
                "{} {} tenders (page {}/{})",
                style("list").cyan(),
                page.total,
                page.page,
                page.total_pages.max(1)
            );
        }
        SyncEvent::TenderListFailed(err) => {
            println!("{} list refresh failed: {err}", style("!").yellow());
        }
        SyncEvent::ScraperStatusUpdated(status) => {
            if status.is_running {
                println!(
                    "{} {} — {} found, {} downloaded, {} failed",
                    style("scraper").magenta(),
                    status.current_phase,
                    status.total_tenders,
                    status.downloaded,
                    status.failed
                );
            }
        }
        SyncEvent::ScraperStatusFailed(err) => {
            println!("{} scraper poll failed: {err}", style("!").yellow());
        }
    }
}
