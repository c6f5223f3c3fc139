//! Scraper job wire types: run/stop receipts and the 2-second status poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body for `POST /api/scraper/run`. Dates are `YYYY-MM-DD`; the server
/// defaults both when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScraperRunRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Receipt returned when a scraper run is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperRunReceipt {
    pub job_id: String,
    pub date_range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Receipt for `POST /api/scraper/stop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopReceipt {
    pub stopped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A log line reported by the server inside the status payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerLogLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub message: String,
}

/// Snapshot from `GET /api/scraper/status`, polled every 2 seconds
/// while a run is being watched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperStatus {
    pub is_running: bool,
    pub current_phase: String,
    pub total_tenders: u64,
    pub downloaded: u64,
    pub failed: u64,
    pub elapsed_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<ServerLogLine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<serde_json::Value>,
}

impl ScraperStatus {
    /// An idle snapshot, used before the first poll answers.
    pub fn idle() -> Self {
        Self {
            is_running: false,
            current_phase: "Idle".to_string(),
            total_tenders: 0,
            downloaded: 0,
            failed: 0,
            elapsed_seconds: 0.0,
            last_run: None,
            logs: None,
            stats: None,
        }
    }
}
