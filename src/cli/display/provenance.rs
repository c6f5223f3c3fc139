//! Rendering of provenance-tracked fields.
//!
//! An absent value is a normal state of the pipeline, so it renders as
//! a dimmed "Not extracted" placeholder — never as an error marker.

use console::style;

use crate::domain::merge::MergedLot;
use crate::domain::models::{Deadline, Money, TenderStatus, TrackedValue};

use super::format;
use super::table::list_table;

/// Placeholder for fields phase 1/2 has not produced yet.
pub const NOT_EXTRACTED: &str = "Not extracted";

/// Render a tracked field with its provenance annotation.
pub fn tracked<T>(field: &TrackedValue<T>, render: impl FnOnce(&T) -> String) -> String {
    match &field.value {
        Some(value) => format!("{}{}", render(value), annotation(field)),
        None => style(NOT_EXTRACTED).dim().italic().to_string(),
    }
}

/// "[AVIS 2024-03-01]" suffix, dimmed; empty without a source.
fn annotation<T>(field: &TrackedValue<T>) -> String {
    match (&field.source, &field.source_date) {
        (Some(source), Some(date)) => format!(
            " {}",
            style(format!("[{} {}]", source.as_str(), date.format("%Y-%m-%d"))).dim()
        ),
        (Some(source), None) => format!(" {}", style(format!("[{}]", source.as_str())).dim()),
        _ => String::new(),
    }
}

pub fn tracked_str(field: &TrackedValue<String>) -> String {
    tracked(field, String::clone)
}

pub fn tracked_money(field: &TrackedValue<Money>) -> String {
    tracked(field, format::money)
}

pub fn tracked_deadline(field: &TrackedValue<Deadline>) -> String {
    tracked(field, |deadline| {
        match (&deadline.date, &deadline.time) {
            (Some(date), Some(time)) => format!("{date} {time}"),
            (Some(date), None) => date.to_string(),
            (None, Some(time)) => time.clone(),
            (None, None) => NOT_EXTRACTED.to_string(),
        }
    })
}

/// Status with its conventional color.
pub fn status_label(status: TenderStatus) -> String {
    let styled = match status {
        TenderStatus::Pending => style(status.as_str()).yellow(),
        TenderStatus::Listed => style(status.as_str()).cyan(),
        TenderStatus::Analyzed => style(status.as_str()).green(),
        TenderStatus::Error => style(status.as_str()).red(),
    };
    styled.to_string()
}

/// The persistent banner shown while the health probe fails.
pub fn offline_banner() -> String {
    style("! Backend unreachable — showing cached data, retrying on schedule")
        .yellow()
        .bold()
        .to_string()
}

/// Merged lot sequence as a table: phase-1 columns first, deep-data
/// columns populated only where phase 2 correlated.
pub fn merged_lot_table(lots: &[MergedLot<'_>]) -> comfy_table::Table {
    let mut table = list_table(&[
        "lot", "subject", "estimated", "guarantee", "delay", "items",
    ]);
    for merged in lots {
        let lot = merged.lot;
        let (delay, items) = match merged.deep {
            Some(deep) => (
                tracked(&deep.execution_delay, |d| format!("{} {}", d.value, d.unit)),
                deep.items.len().to_string(),
            ),
            None => (style("—").dim().to_string(), style("—").dim().to_string()),
        };
        table.add_row(vec![
            lot.lot_number.clone().unwrap_or_else(|| "?".to_string()),
            format::truncate_ellipsis(&tracked_str(&lot.subject), 48),
            tracked_money(&lot.estimated_value),
            tracked_money(&lot.provisional_guarantee),
            delay,
            items,
        ]);
    }
    table
}
