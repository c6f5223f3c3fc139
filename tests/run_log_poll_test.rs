//! The run log fed by the scraper status poll: server batches merge
//! with local lines, duplicates collapse, and a new run takes over the
//! log wholesale.

mod common;

use std::sync::Arc;

use common::{running_status, MockApi};
use tenderctl::domain::models::{PollingConfig, ScraperStatus, ServerLogLine};
use tenderctl::services::run_log::{LogLevel, RunLog};
use tenderctl::services::SyncEngine;

fn line(message: &str) -> ServerLogLine {
    ServerLogLine {
        timestamp: None,
        level: Some("info".to_string()),
        message: message.to_string(),
    }
}

#[tokio::test]
async fn server_batches_from_the_status_poll_merge_and_dedup() {
    let api = Arc::new(MockApi::new());

    let mut first = running_status("Scraping portal");
    first.logs = Some(vec![
        line("Found 12 consultations"),
        line("Downloading 1/12"),
    ]);
    let mut second = running_status("Downloading DCE bundles");
    // server re-sends the whole tail; overlap must not duplicate
    second.logs = Some(vec![
        line("Found 12 consultations"),
        line("Downloading 1/12"),
        line("Downloading 2/12"),
    ]);
    let mut finished = ScraperStatus::idle();
    finished.downloaded = 12;

    api.push_status(first);
    api.push_status(second);
    api.push_status(finished);

    let engine = Arc::new(SyncEngine::new(
        Arc::clone(&api) as Arc<dyn tenderctl::domain::ports::TenderApi>,
        PollingConfig::default(),
    ));

    let mut log = RunLog::new();
    log.begin_run("2024-03-01");

    for _ in 0..3 {
        let status = engine.refresh_scraper_status().await.unwrap();
        log.absorb_status(&status);
    }

    let messages: Vec<&str> = log.entries().iter().map(|e| e.message.as_str()).collect();

    // the overlapping batch collapsed to a single entry
    assert_eq!(
        messages
            .iter()
            .filter(|m| **m == "Found 12 consultations")
            .count(),
        1
    );

    // surviving entries keep first-arrival order
    let one = messages.iter().position(|m| *m == "Downloading 1/12").unwrap();
    let two = messages.iter().position(|m| *m == "Downloading 2/12").unwrap();
    assert!(one < two);

    // derived lifecycle lines: bootstrap, start, phase change, finish
    assert!(messages.iter().any(|m| m.contains("2024-03-01")));
    assert!(messages.iter().any(|m| m.starts_with("Scraper running")));
    assert!(messages
        .iter()
        .any(|m| *m == "Phase: Downloading DCE bundles"));
    let last = log.entries().last().unwrap();
    assert_eq!(last.level, LogLevel::Success);
    assert!(last.message.contains("12 downloaded"));
}

#[tokio::test]
async fn a_second_run_takes_over_the_log() {
    let api = Arc::new(MockApi::new());
    let mut status = running_status("Scraping portal");
    status.logs = Some(vec![line("First run output")]);
    api.push_status(status);

    let engine = Arc::new(SyncEngine::new(
        Arc::clone(&api) as Arc<dyn tenderctl::domain::ports::TenderApi>,
        PollingConfig::default(),
    ));

    let mut log = RunLog::new();
    log.begin_run("2024-03-01");
    let first = engine.refresh_scraper_status().await.unwrap();
    log.absorb_status(&first);
    assert!(log.entries().iter().any(|e| e.message == "First run output"));

    // the user starts another run before the first's logs settle
    log.begin_run("2024-03-02");
    assert!(log.entries().iter().all(|e| e.message != "First run output"));
    assert!(log
        .entries()
        .iter()
        .any(|e| e.message.contains("2024-03-02")));
}
