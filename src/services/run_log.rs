//! Append-only log of the latest scraper run.
//!
//! Two producers feed one timeline: locally-issued command feedback and
//! server log batches arriving with the 2-second status poll. Server
//! entries deduplicate on exact message text; first arrival wins and
//! order is preserved. Starting a new run clears the log — it is scoped
//! to the latest run, not cumulative.

use chrono::{DateTime, Utc};

use crate::domain::models::{ScraperStatus, ServerLogLine};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Map a server-reported level string, defaulting to info.
    fn from_server(level: Option<&str>) -> Self {
        match level.map(str::to_lowercase).as_deref() {
            Some("success") => Self::Success,
            Some("warning" | "warn") => Self::Warning,
            Some("error") => Self::Error,
            _ => Self::Info,
        }
    }
}

/// One line in the run timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// The aggregated, deduplicated run timeline.
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
    seen: std::collections::HashSet<String>,
    cursor: usize,
    last_running: Option<bool>,
    last_phase: Option<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh run: clear everything and append the bootstrap
    /// lines before the run produces output.
    pub fn begin_run(&mut self, date_range: &str) {
        self.entries.clear();
        self.seen.clear();
        self.cursor = 0;
        self.last_running = None;
        self.last_phase = None;

        self.push(LogLevel::Info, format!("Starting scraper run for {date_range}"));
        self.push(LogLevel::Info, "Waiting for the backend to pick up the job".to_string());
    }

    /// Append a locally-issued entry in arrival order.
    pub fn push(&mut self, level: LogLevel, message: String) {
        self.seen.insert(message.clone());
        self.entries.push(LogEntry {
            timestamp: Utc::now(),
            level,
            message,
        });
    }

    /// Fold one status snapshot into the timeline: derived lifecycle
    /// lines (started / phase changes / finished) plus the server's own
    /// log batch, deduplicated by message text.
    pub fn absorb_status(&mut self, status: &ScraperStatus) {
        match (self.last_running, status.is_running) {
            (Some(false) | None, true) => {
                self.push(LogLevel::Info, format!("Scraper running: {}", status.current_phase));
            }
            (Some(true), false) => {
                if status.failed > 0 {
                    self.push(
                        LogLevel::Warning,
                        format!(
                            "Run finished: {} downloaded, {} failed",
                            status.downloaded, status.failed
                        ),
                    );
                } else {
                    self.push(
                        LogLevel::Success,
                        format!("Run finished: {} downloaded", status.downloaded),
                    );
                }
            }
            _ => {}
        }
        self.last_running = Some(status.is_running);

        if status.is_running && self.last_phase.as_deref() != Some(status.current_phase.as_str()) {
            if self.last_phase.is_some() {
                self.push(LogLevel::Info, format!("Phase: {}", status.current_phase));
            }
            self.last_phase = Some(status.current_phase.clone());
        }

        if let Some(lines) = &status.logs {
            for line in lines {
                self.absorb_server_line(line);
            }
        }
    }

    fn absorb_server_line(&mut self, line: &ServerLogLine) {
        // dedup on exact message text; first arrival keeps its slot
        if self.seen.contains(&line.message) {
            return;
        }
        self.seen.insert(line.message.clone());
        self.entries.push(LogEntry {
            timestamp: line.timestamp.unwrap_or_else(Utc::now),
            level: LogLevel::from_server(line.level.as_deref()),
            message: line.message.clone(),
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries appended since the previous call. The display loop
    /// prints exactly these, which is what makes the terminal follow
    /// the tail of the log.
    pub fn take_new(&mut self) -> Vec<LogEntry> {
        let new = self.entries[self.cursor..].to_vec();
        self.cursor = self.entries.len();
        new
    }
}
