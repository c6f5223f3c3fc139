//! `tenderctl list` — filtered, paginated tender listing.

use anyhow::{bail, Result};
use clap::Args;
use console::style;

use crate::cli::display::format::truncate_ellipsis;
use crate::cli::display::provenance::{status_label, tracked_str, NOT_EXTRACTED};
use crate::cli::display::table::{list_table, render_list};
use crate::domain::merge::has_deep_data;
use crate::domain::models::{TenderPage, TenderQuery, TenderStatus};

use super::AppContext;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Search text (matched against reference, subject, institution)
    #[arg(long, short)]
    pub q: Option<String>,

    /// Filter by status: PENDING, LISTED, ANALYZED, ERROR
    #[arg(long)]
    pub status: Option<String>,

    /// Earliest download date (YYYY-MM-DD)
    #[arg(long)]
    pub date_from: Option<String>,

    /// Latest download date (YYYY-MM-DD)
    #[arg(long)]
    pub date_to: Option<String>,

    /// Page number, 1-based
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Page size
    #[arg(long, default_value_t = 20)]
    pub per_page: u32,
}

impl ListArgs {
    pub fn to_query(&self) -> Result<TenderQuery> {
        let status = match &self.status {
            Some(raw) => match TenderStatus::from_str(raw) {
                Some(status) => Some(status),
                None => bail!("unknown status '{raw}' (expected PENDING, LISTED, ANALYZED or ERROR)"),
            },
            None => None,
        };
        Ok(TenderQuery {
            q: self.q.clone(),
            status,
            date_from: self.date_from.clone(),
            date_to: self.date_to.clone(),
            page: self.page.max(1),
            per_page: self.per_page.max(1),
        })
    }
}

pub async fn execute(args: ListArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let query = args.to_query()?;

    match ctx.engine.tenders(&query).await {
        Ok(page) => {
            if json_mode {
                println!("{}", serde_json::to_string_pretty(&*page)?);
            } else {
                println!("{}", render_page(&page));
            }
            Ok(())
        }
        Err(err) => {
            if !json_mode {
                eprintln!(
                    "{} {err}\n  run the command again to retry",
                    style("fetch failed:").red()
                );
            }
            Err(err.into())
        }
    }
}

fn render_page(page: &TenderPage) -> String {
    let mut table = list_table(&["id", "reference", "subject", "status", "lots", "deep"]);
    for tender in &page.items {
        let (subject, lots) = tender.avis_metadata.as_ref().map_or_else(
            || (NOT_EXTRACTED.to_string(), "-".to_string()),
            |meta| (tracked_str(&meta.subject), meta.lots.len().to_string()),
        );
        table.add_row(vec![
            crate::cli::display::format::short_id(&tender.id.to_string()).to_string(),
            tender
                .external_reference
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            truncate_ellipsis(&subject, 48),
            status_label(tender.status),
            lots,
            if has_deep_data(tender) { "✓" } else { "·" }.to_string(),
        ]);
    }

    let body = render_list("tender", &table, page.total);
    let mut footer = format!("Page {} of {}", page.page, page.total_pages.max(1));
    if page.has_prev() {
        footer.push_str(&format!("  ← --page {}", page.page - 1));
    }
    if page.has_next() {
        footer.push_str(&format!("  → --page {}", page.page + 1));
    }
    format!("{body}\n{footer}")
}
