//! `tenderctl ask` — question answering over a tender's documents.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

use super::AppContext;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Tender id
    pub id: Uuid,

    /// Question to ask about this tender
    pub question: String,
}

pub async fn execute(args: AskArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let spinner = if json_mode {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .expect("valid spinner template"),
        );
        spinner.set_message("Asking the document pipeline…");
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    };

    let result = ctx.engine.ask(args.id, &args.question).await;
    spinner.finish_and_clear();

    match result {
        Ok(answer) => {
            if json_mode {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}", answer.answer);
                if !answer.citations.is_empty() {
                    println!("\n{}", style("Sources").bold());
                    for citation in &answer.citations {
                        match citation.page {
                            Some(page) => println!("  {} (p. {page})", citation.document),
                            None => println!("  {}", citation.document),
                        }
                    }
                }
            }
            Ok(())
        }
        Err(err) => {
            if !json_mode {
                eprintln!("{} {err}", style("question failed:").red());
            }
            Err(err.into())
        }
    }
}
