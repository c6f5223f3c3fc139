//! Small formatters shared by the CLI commands.

use chrono::{DateTime, Utc};

use crate::domain::models::Money;

/// First 8 chars of a UUID string for list display.
pub fn short_id(id: &str) -> &str {
    if id.len() >= 8 {
        &id[..8]
    } else {
        id
    }
}

/// Format an optional timestamp or "-".
pub fn datetime_opt(dt: Option<&DateTime<Utc>>) -> String {
    match dt {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Format a monetary amount with its currency when known.
pub fn money(value: &Money) -> String {
    match &value.currency {
        Some(currency) => format!("{:.2} {currency}", value.amount),
        None => format!("{:.2}", value.amount),
    }
}

/// Truncate a string with unicode ellipsis.
pub fn truncate_ellipsis(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{cut}\u{2026}")
    }
}

/// Format an elapsed duration in seconds as "1m 23s".
pub fn elapsed(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    if total >= 60 {
        format!("{}m {:02}s", total / 60, total % 60)
    } else {
        format!("{total}s")
    }
}
