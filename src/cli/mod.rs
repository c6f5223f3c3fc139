//! Command-line interface: argument parsing, dispatch, display.

pub mod commands;
pub mod display;

use clap::{Parser, Subcommand};
use console::style;

use commands::{analyze::AnalyzeArgs, ask::AskArgs, list::ListArgs, scraper::ScraperArgs, show::ShowArgs, watch::WatchArgs};

#[derive(Parser, Debug)]
#[command(
    name = "tenderctl",
    about = "Terminal client for the tender document-intelligence platform",
    version
)]
pub struct Cli {
    /// Emit machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a specific config file instead of .tenderctl/config.yaml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe backend health once
    Health,
    /// List tenders with filters and pagination
    List(ListArgs),
    /// Show one tender with provenance and merged lots
    Show(ShowArgs),
    /// Trigger deep analysis with live progress
    Analyze(AnalyzeArgs),
    /// Ask a question about a tender's documents
    Ask(AskArgs),
    /// Control and watch the scraper
    Scraper(ScraperArgs),
    /// Live dashboard over all polling cadences
    Watch(WatchArgs),
}

/// Print a top-level error and exit non-zero.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        eprintln!(
            "{}",
            serde_json::json!({ "success": false, "error": format!("{err:#}") })
        );
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
    }
    std::process::exit(1);
}
