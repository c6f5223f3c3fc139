//! Integration tests for the analysis progress state machine: simulated
//! progress bounds, completion handoff, failure, cancellation, and
//! trigger gating.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use common::{make_tender, MockApi};
use tenderctl::domain::models::{PollingConfig, TenderStatus};
use tenderctl::services::analysis::{AnalysisEvent, AnalysisRunner, StartOutcome};
use tenderctl::services::SyncEngine;

fn setup(api: &Arc<MockApi>) -> (Arc<SyncEngine>, AnalysisRunner) {
    let engine = Arc::new(SyncEngine::new(
        Arc::clone(api) as Arc<dyn tenderctl::domain::ports::TenderApi>,
        PollingConfig::default(),
    ));
    let runner = AnalysisRunner::new(Arc::clone(&engine));
    (engine, runner)
}

async fn drain_until_terminal(
    rx: &mut mpsc::UnboundedReceiver<AnalysisEvent>,
) -> Vec<AnalysisEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        let terminal = matches!(
            event,
            AnalysisEvent::Completed { .. } | AnalysisEvent::Failed { .. }
        );
        events.push(event);
        if terminal {
            break;
        }
    }
    events
}

#[tokio::test(start_paused = true)]
async fn progress_is_monotonic_and_below_100_until_the_real_response() {
    let api = Arc::new(MockApi::new());
    api.set_analyze_delay(Duration::from_secs(20));
    let (_engine, runner) = setup(&api);
    let id = api.tender_id;

    let (tx, mut rx) = mpsc::unbounded_channel();
    assert_eq!(runner.start(id, tx).await, StartOutcome::Started);

    let events = drain_until_terminal(&mut rx).await;

    let progress_values: Vec<(u8, &str)> = events
        .iter()
        .filter_map(|event| match event {
            AnalysisEvent::Progress {
                progress, message, ..
            } => Some((*progress, *message)),
            _ => None,
        })
        .collect();

    // entry action: 10 / "Connecting…"
    assert_eq!(progress_values[0].0, 10);
    assert_eq!(progress_values[0].1, "Connecting…");

    // 20 seconds of 500ms ticks: plenty of simulated movement
    assert!(progress_values.len() > 10);

    let (simulated, completion) = progress_values.split_at(progress_values.len() - 1);
    for pair in simulated.windows(2) {
        assert!(pair[1].0 >= pair[0].0, "progress must never decrease");
    }
    for (progress, _) in simulated {
        assert!(*progress < 100, "simulation may never claim completion");
        assert!(*progress <= 90, "simulation is clamped at 90");
    }

    // the real response snaps to exactly 100
    assert_eq!(completion[0], (100, "Complete"));

    match events.last().unwrap() {
        AnalysisEvent::Completed { tender, .. } => {
            assert_eq!(tender.status, TenderStatus::Analyzed);
            assert!(tender.universal_metadata.is_some());
        }
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn long_runs_saturate_at_the_ceiling() {
    let api = Arc::new(MockApi::new());
    api.set_analyze_delay(Duration::from_secs(120));
    let (_engine, runner) = setup(&api);

    let (tx, mut rx) = mpsc::unbounded_channel();
    runner.start(api.tender_id, tx).await;

    let events = drain_until_terminal(&mut rx).await;
    let max_simulated = events
        .iter()
        .filter_map(|event| match event {
            AnalysisEvent::Progress { progress: 100, .. } => None,
            AnalysisEvent::Progress { progress, .. } => Some(*progress),
            _ => None,
        })
        .max()
        .unwrap();
    assert_eq!(max_simulated, 90);
}

#[tokio::test(start_paused = true)]
async fn failure_surfaces_without_reaching_100() {
    let api = Arc::new(MockApi::new());
    api.analyze_fails.store(true, Ordering::SeqCst);
    api.set_analyze_delay(Duration::from_secs(3));
    let (_engine, runner) = setup(&api);

    let (tx, mut rx) = mpsc::unbounded_channel();
    runner.start(api.tender_id, tx).await;

    let events = drain_until_terminal(&mut rx).await;

    match events.last().unwrap() {
        AnalysisEvent::Failed { error, .. } => {
            assert!(error.to_string().contains("Deep analysis failed"));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(events.iter().all(|event| !matches!(
        event,
        AnalysisEvent::Progress { progress: 100, .. }
    )));

    // the machine is Idle again: a new run may start
    assert!(runner.is_idle().await);
}

#[tokio::test(start_paused = true)]
async fn manual_trigger_is_disabled_while_requesting() {
    let api = Arc::new(MockApi::new());
    api.set_analyze_delay(Duration::from_secs(10));
    let (_engine, runner) = setup(&api);
    let id = api.tender_id;

    let (tx, mut rx) = mpsc::unbounded_channel();
    assert_eq!(runner.start(id, tx.clone()).await, StartOutcome::Started);
    assert_eq!(runner.start(id, tx.clone()).await, StartOutcome::Busy);
    drop(tx);

    drain_until_terminal(&mut rx).await;
    assert!(runner.is_idle().await);
    assert_eq!(api.analyze_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_tears_down_ticker_and_response_handling() {
    let api = Arc::new(MockApi::new());
    api.set_analyze_delay(Duration::from_secs(30));
    let (_engine, runner) = setup(&api);

    let (tx, mut rx) = mpsc::unbounded_channel();
    runner.start(api.tender_id, tx).await;

    // let a few ticks happen, then navigate away
    sleep(Duration::from_secs(2)).await;
    runner.cancel().await;
    let generation_after_cancel = runner.current_generation().await;

    // drain whatever was queued before the cancel
    while rx.try_recv().is_ok() {}

    // even after the backend would have answered, no event for the
    // abandoned identity arrives
    sleep(Duration::from_secs(60)).await;
    assert!(rx.try_recv().is_err());
    assert!(runner.is_idle().await);

    // a fresh run gets a fresh generation
    let (tx2, mut rx2) = mpsc::unbounded_channel();
    assert_eq!(runner.start(api.tender_id, tx2).await, StartOutcome::Started);
    let events = drain_until_terminal(&mut rx2).await;
    for event in &events {
        let generation = match event {
            AnalysisEvent::Started { generation, .. }
            | AnalysisEvent::Progress { generation, .. }
            | AnalysisEvent::Completed { generation, .. }
            | AnalysisEvent::Failed { generation, .. } => *generation,
        };
        assert!(generation > generation_after_cancel);
    }
}

#[tokio::test(start_paused = true)]
async fn auto_start_respects_eligibility() {
    let api = Arc::new(MockApi::new());
    let (_engine, runner) = setup(&api);
    let id = api.tender_id;

    let (tx, mut rx) = mpsc::unbounded_channel();

    // PENDING: phase 1 not finished, never auto-analyze
    let pending = make_tender(id, TenderStatus::Pending, false);
    assert_eq!(
        runner.auto_start(&pending, tx.clone()).await,
        StartOutcome::NotEligible
    );

    // ANALYZED with deep data: never re-fire
    let analyzed = make_tender(id, TenderStatus::Analyzed, true);
    assert_eq!(
        runner.auto_start(&analyzed, tx.clone()).await,
        StartOutcome::NotEligible
    );

    // LISTED without deep data: fire
    let listed = make_tender(id, TenderStatus::Listed, false);
    assert_eq!(
        runner.auto_start(&listed, tx.clone()).await,
        StartOutcome::Started
    );
    drop(tx);
    let events = drain_until_terminal(&mut rx).await;
    assert!(matches!(
        events.last().unwrap(),
        AnalysisEvent::Completed { .. }
    ));
    assert_eq!(api.analyze_calls.load(Ordering::SeqCst), 1);
}
