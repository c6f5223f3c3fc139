//! `tenderctl show` — full tender detail with provenance and merged lots.

use anyhow::Result;
use clap::Args;
use console::style;
use uuid::Uuid;

use crate::cli::display::format::datetime_opt;
use crate::cli::display::provenance::{
    merged_lot_table, status_label, tracked, tracked_deadline, tracked_money, tracked_str,
};
use crate::cli::display::table::list_table;
use crate::domain::merge::{has_deep_data, merge_lots};
use crate::domain::models::Tender;

use super::analyze::auto_run_with_progress;
use super::AppContext;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Tender id
    pub id: Uuid,

    /// Do not kick off deep analysis automatically
    #[arg(long)]
    pub no_auto: bool,
}

pub async fn execute(args: ShowArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let tender = match ctx.engine.tender_detail(args.id).await {
        Ok(tender) => tender,
        Err(err) => {
            if !json_mode {
                eprintln!(
                    "{} {err}\n  run the command again to retry",
                    style("fetch failed:").red()
                );
            }
            return Err(err.into());
        }
    };

    // Auto-trigger fires at most once per successful load, and only
    // when the record qualifies; the merge module is the authority.
    let tender = if args.no_auto {
        (*tender).clone()
    } else {
        match auto_run_with_progress(&ctx.engine, &tender, json_mode).await {
            Ok(Some(updated)) => updated,
            Ok(None) => (*tender).clone(),
            Err(err) => {
                // analysis failure is transient feedback, not a reason
                // to hide the record we already have
                if !json_mode {
                    eprintln!("{} {err}", style("analysis failed:").red());
                }
                (*tender).clone()
            }
        }
    };

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&tender)?);
    } else {
        print!("{}", render_detail(&tender));
    }
    Ok(())
}

fn field(label: &str, value: &str) -> String {
    format!("  {:<22} {value}\n", style(label).bold())
}

#[allow(clippy::too_many_lines)]
fn render_detail(tender: &Tender) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {}\n",
        style(tender.label()).bold().underlined(),
        status_label(tender.status)
    ));
    out.push_str(&field("Source", &tender.source_url));
    out.push_str(&field(
        "Scraped",
        &datetime_opt(tender.scraped_at.as_ref()),
    ));
    if let Some(error) = &tender.error_message {
        out.push_str(&field("Error", &style(error).red().to_string()));
    }

    if let Some(meta) = &tender.avis_metadata {
        out.push_str(&format!("\n{}\n", style("Notice (phase 1)").bold()));
        out.push_str(&field("Reference", &tracked_str(&meta.reference_tender)));
        out.push_str(&field("Type", &tracked_str(&meta.tender_type)));
        out.push_str(&field(
            "Institution",
            &tracked_str(&meta.issuing_institution),
        ));
        out.push_str(&field("Subject", &tracked_str(&meta.subject)));
        out.push_str(&field(
            "Opening location",
            &tracked_str(&meta.folder_opening_location),
        ));
        out.push_str(&field(
            "Estimated value",
            &tracked_money(&meta.total_estimated_value),
        ));
        out.push_str(&field(
            "Deadline",
            &tracked_deadline(&meta.submission_deadline),
        ));
        if let Some(extended) = &meta.website_extended {
            out.push_str(&field(
                "Contact (portal)",
                &tracked_str(&extended.contact_administratif),
            ));
        }
        if !meta.keywords.is_empty() {
            let mut langs: Vec<_> = meta.keywords.iter().collect();
            langs.sort_by_key(|(lang, _)| lang.clone());
            for (lang, words) in langs {
                out.push_str(&field(
                    &format!("Keywords ({lang})"),
                    &words.join(", "),
                ));
            }
        }

        let deep_lots = tender
            .universal_metadata
            .as_ref()
            .map_or(&[][..], |universal| universal.lots.as_slice());
        if !meta.lots.is_empty() {
            let merged = merge_lots(&meta.lots, deep_lots);
            out.push_str(&format!("\n{}\n", style("Lots").bold()));
            out.push_str(&format!("{}\n", merged_lot_table(&merged)));
        }
    } else {
        out.push_str(&format!(
            "\n{}\n",
            style("Notice metadata not extracted yet").dim().italic()
        ));
    }

    if let Some(universal) = &tender.universal_metadata {
        out.push_str(&format!("\n{}\n", style("Deep analysis (phase 2)").bold()));
        out.push_str(&field(
            "Institution address",
            &tracked_str(&universal.institution_address),
        ));
        let conditions = &universal.additional_conditions;
        out.push_str(&field(
            "Qualification",
            &tracked_str(&conditions.qualification_criteria),
        ));
        out.push_str(&field(
            "Required documents",
            &tracked(&conditions.required_documents, |docs| docs.join(", ")),
        ));
        out.push_str(&field(
            "Warranty period",
            &tracked_str(&conditions.warranty_period),
        ));
        out.push_str(&field(
            "Payment terms",
            &tracked_str(&conditions.payment_terms),
        ));
        if let Some(contact) = &universal.contact {
            let line = [
                contact.name.as_deref(),
                contact.phone.as_deref(),
                contact.email.as_deref(),
                contact.address.as_deref(),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" · ");
            out.push_str(&field("Contact", &line));
        }
    } else if !has_deep_data(tender) {
        out.push_str(&format!(
            "\n{}\n",
            style("Deep analysis not run yet").dim().italic()
        ));
    }

    if !tender.documents.is_empty() {
        out.push_str(&format!("\n{}\n", style("Documents").bold()));
        let mut table = list_table(&["type", "filename", "pages", "method"]);
        for doc in &tender.documents {
            table.add_row(vec![
                doc.document_type.as_str().to_string(),
                doc.filename.clone(),
                doc.page_count.map_or_else(|| "-".to_string(), |n| n.to_string()),
                doc.extraction_method
                    .map_or_else(|| "-".to_string(), |m| m.as_str().to_string()),
            ]);
        }
        out.push_str(&format!("{table}\n"));
    }

    out
}
