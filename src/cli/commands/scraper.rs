//! `tenderctl scraper` — run, stop, and watch the crawl/download job.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use console::style;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::cli::display::format::elapsed;
use crate::domain::models::ScraperRunRequest;
use crate::services::run_log::{LogEntry, LogLevel, RunLog};

use super::AppContext;

#[derive(Args, Debug)]
pub struct ScraperArgs {
    #[command(subcommand)]
    pub command: ScraperCommand,
}

#[derive(Subcommand, Debug)]
pub enum ScraperCommand {
    /// Start a scraper run over a date range
    Run {
        /// Start of the date range (YYYY-MM-DD), server defaults to today
        #[arg(long)]
        start_date: Option<String>,

        /// End of the date range (YYYY-MM-DD), defaults to start date
        #[arg(long)]
        end_date: Option<String>,

        /// Stay attached and stream the run log until it finishes
        #[arg(long)]
        watch: bool,
    },
    /// Stop the running scraper
    Stop,
    /// Show the current scraper status once
    Status,
    /// Stream the run log of whatever is currently running
    Watch,
}

pub async fn execute(args: ScraperArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    match args.command {
        ScraperCommand::Run {
            start_date,
            end_date,
            watch,
        } => run(start_date, end_date, watch, ctx, json_mode).await,
        ScraperCommand::Stop => stop(ctx, json_mode).await,
        ScraperCommand::Status => status(ctx, json_mode).await,
        ScraperCommand::Watch => {
            let mut log = RunLog::new();
            watch_run(&mut log, ctx, json_mode).await
        }
    }
}

fn validate_date(label: &str, value: &Option<String>) -> Result<()> {
    if let Some(raw) = value {
        if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_err() {
            bail!("invalid {label} '{raw}': expected YYYY-MM-DD");
        }
    }
    Ok(())
}

async fn run(
    start_date: Option<String>,
    end_date: Option<String>,
    watch: bool,
    ctx: &AppContext,
    json_mode: bool,
) -> Result<()> {
    validate_date("start date", &start_date)?;
    validate_date("end date", &end_date)?;

    let range_label = match (&start_date, &end_date) {
        (Some(start), Some(end)) => format!("{start} to {end}"),
        (Some(start), None) => start.clone(),
        _ => "today".to_string(),
    };

    // a new run owns the log: previous run output is cleared before
    // the bootstrap lines go in
    let mut log = RunLog::new();
    log.begin_run(&range_label);
    print_new_entries(&mut log, json_mode);

    let request = ScraperRunRequest {
        start_date,
        end_date,
    };
    match ctx.engine.run_scraper(&request).await {
        Ok(receipt) => {
            log.push(
                LogLevel::Success,
                format!("Run accepted: job {} ({})", receipt.job_id, receipt.date_range),
            );
            print_new_entries(&mut log, json_mode);
        }
        Err(err) => {
            if !json_mode {
                eprintln!("{} {err}", style("scraper run failed:").red());
            }
            return Err(err.into());
        }
    }

    if watch {
        watch_run(&mut log, ctx, json_mode).await?;
    }
    Ok(())
}

async fn stop(ctx: &AppContext, json_mode: bool) -> Result<()> {
    match ctx.engine.stop_scraper().await {
        Ok(receipt) => {
            if json_mode {
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            } else if receipt.stopped {
                println!("Scraper stopped.");
            } else {
                println!(
                    "{}",
                    receipt
                        .message
                        .unwrap_or_else(|| "No scraper running.".to_string())
                );
            }
            Ok(())
        }
        Err(err) => {
            if !json_mode {
                eprintln!("{} {err}", style("stop failed:").red());
            }
            Err(err.into())
        }
    }
}

async fn status(ctx: &AppContext, json_mode: bool) -> Result<()> {
    match ctx.engine.scraper_status().await {
        Ok(status) => {
            if json_mode {
                println!("{}", serde_json::to_string_pretty(&*status)?);
            } else {
                let state = if status.is_running {
                    style("running").green().to_string()
                } else {
                    style("idle").dim().to_string()
                };
                println!("Scraper {state} — {}", status.current_phase);
                println!("  found      {}", status.total_tenders);
                println!("  downloaded {}", status.downloaded);
                println!("  failed     {}", status.failed);
                println!("  elapsed    {}", elapsed(status.elapsed_seconds));
                if let Some(last_run) = &status.last_run {
                    println!("  last run   {last_run}");
                }
            }
            Ok(())
        }
        Err(err) => {
            if !json_mode {
                eprintln!("{} {err}", style("status fetch failed:").red());
            }
            Err(err.into())
        }
    }
}

/// Poll the status endpoint on the scraper cadence, folding each
/// snapshot into the run log and printing whatever is new. Stops once
/// a run has been observed and finishes.
async fn watch_run(log: &mut RunLog, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let mut tick = interval(Duration::from_secs(
        ctx.config.polling.scraper_interval_secs,
    ));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut seen_running = false;
    let mut idle_polls = 0u32;

    loop {
        tick.tick().await;

        match ctx.engine.refresh_scraper_status().await {
            Ok(status) => {
                log.absorb_status(&status);
                print_new_entries(log, json_mode);

                if status.is_running {
                    seen_running = true;
                    idle_polls = 0;
                } else if seen_running {
                    break;
                } else {
                    idle_polls += 1;
                    // nothing started within a reasonable window
                    if idle_polls >= 15 {
                        log.push(LogLevel::Warning, "No running scraper observed".to_string());
                        print_new_entries(log, json_mode);
                        break;
                    }
                }
            }
            Err(err) => {
                // transient poll failures surface once, then the loop
                // keeps its cadence
                log.push(LogLevel::Error, format!("status poll failed: {err}"));
                print_new_entries(log, json_mode);
            }
        }
    }
    Ok(())
}

/// Print entries appended since the last call; the terminal naturally
/// follows the newest line.
fn print_new_entries(log: &mut RunLog, json_mode: bool) {
    for entry in log.take_new() {
        if json_mode {
            println!(
                "{}",
                serde_json::json!({
                    "timestamp": entry.timestamp.to_rfc3339(),
                    "level": entry.level.as_str(),
                    "message": entry.message,
                })
            );
        } else {
            println!("{}", render_entry(&entry));
        }
    }
}

fn render_entry(entry: &LogEntry) -> String {
    let ts = entry.timestamp.format("%H:%M:%S");
    let marker = match entry.level {
        LogLevel::Info => style("·").dim(),
        LogLevel::Success => style("✓").green(),
        LogLevel::Warning => style("!").yellow(),
        LogLevel::Error => style("✗").red(),
    };
    format!("{} {marker} {}", style(ts).dim(), entry.message)
}
