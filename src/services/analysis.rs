//! Simulated-progress state machine for the deep-analysis mutation.
//!
//! The real duration of `POST /api/tenders/{id}/analyze` is unknown, so
//! while the request is in flight a 500ms ticker advances a progress
//! value by a bounded random increment, clamped at 90 — it can never
//! claim completion on its own. Only the real response snaps progress
//! to 100 (success) or tears the overlay down (failure).
//!
//! One analysis task owns both the ticker and the in-flight request;
//! cancelling the task (navigating away, switching records) drops both,
//! so no update can ever apply to a stale record identity.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::debug;
use uuid::Uuid;

use crate::domain::error::ApiError;
use crate::domain::merge::should_auto_analyze;
use crate::domain::models::Tender;
use crate::services::sync::SyncEngine;

/// Ticker period for simulated progress.
pub const TICK_PERIOD: Duration = Duration::from_millis(500);

/// How long the 100% state stays visible before the overlay clears.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Progress shown the moment the request is issued.
pub const INITIAL_PROGRESS: u8 = 10;

/// Simulated progress never passes this on its own.
pub const SIMULATED_CEILING: u8 = 90;

/// Upper bound of the per-tick random increment.
pub const MAX_TICK_INCREMENT: u8 = 15;

/// Stage label for a given simulated progress value.
pub fn stage_message(progress: u8) -> &'static str {
    if progress < 30 {
        "Extracting document text"
    } else if progress < 50 {
        "Analyzing with AI"
    } else if progress < 70 {
        "Processing lots and items"
    } else {
        "Finalizing extraction"
    }
}

/// Advance simulated progress by one tick, clamped at the ceiling.
pub fn advance(progress: u8, increment: u8) -> u8 {
    progress
        .saturating_add(increment.min(MAX_TICK_INCREMENT))
        .min(SIMULATED_CEILING)
}

/// Progress notifications for one analysis run. `generation` lets a
/// consumer discard events from a run it already cancelled.
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    Started {
        id: Uuid,
        generation: u64,
    },
    Progress {
        id: Uuid,
        generation: u64,
        progress: u8,
        message: &'static str,
    },
    /// The mutation succeeded; carries the updated record to swap in.
    /// Emitted after the settle delay, and the machine is Idle again.
    Completed {
        id: Uuid,
        generation: u64,
        tender: Box<Tender>,
    },
    /// The mutation failed; progress never reached 100.
    Failed {
        id: Uuid,
        generation: u64,
        error: ApiError,
    },
}

/// Outcome of asking the runner to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A run is already in flight; the trigger stays disabled.
    Busy,
    /// Auto-trigger only: the record does not qualify.
    NotEligible,
}

struct RunnerInner {
    generation: u64,
    active: Option<tokio::task::JoinHandle<()>>,
}

/// Owns at most one analysis run at a time.
pub struct AnalysisRunner {
    engine: Arc<SyncEngine>,
    inner: Mutex<RunnerInner>,
}

impl AnalysisRunner {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self {
            engine,
            inner: Mutex::new(RunnerInner {
                generation: 0,
                active: None,
            }),
        }
    }

    /// True when no run is in flight; the manual trigger is enabled
    /// exactly then.
    pub async fn is_idle(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.active.as_ref().is_none_or(|handle| handle.is_finished())
    }

    /// Manual trigger. Refuses while a run is in flight.
    pub async fn start(
        &self,
        id: Uuid,
        events: mpsc::UnboundedSender<AnalysisEvent>,
    ) -> StartOutcome {
        let mut inner = self.inner.lock().await;
        if inner
            .active
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
        {
            return StartOutcome::Busy;
        }

        inner.generation += 1;
        let generation = inner.generation;
        let engine = Arc::clone(&self.engine);
        inner.active = Some(tokio::spawn(run_analysis(engine, id, generation, events)));
        StartOutcome::Started
    }

    /// Auto-trigger after a successful detail load. Callers invoke this
    /// at most once per load; eligibility is decided solely by
    /// [`should_auto_analyze`].
    pub async fn auto_start(
        &self,
        tender: &Tender,
        events: mpsc::UnboundedSender<AnalysisEvent>,
    ) -> StartOutcome {
        if !should_auto_analyze(tender) {
            return StartOutcome::NotEligible;
        }
        self.start(tender.id, events).await
    }

    /// Tear down the in-flight run, if any. The ticker and the pending
    /// response handling are both dropped; the bumped generation marks
    /// any already-queued events stale.
    pub async fn cancel(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        if let Some(handle) = inner.active.take() {
            debug!("cancelling in-flight analysis");
            handle.abort();
        }
    }

    /// Generation of the most recent run; events carrying an older one
    /// are stale.
    pub async fn current_generation(&self) -> u64 {
        self.inner.lock().await.generation
    }
}

/// One analysis run: ticker and request raced in a single task.
async fn run_analysis(
    engine: Arc<SyncEngine>,
    id: Uuid,
    generation: u64,
    events: mpsc::UnboundedSender<AnalysisEvent>,
) {
    let _ = events.send(AnalysisEvent::Started { id, generation });

    let mut progress = INITIAL_PROGRESS;
    let _ = events.send(AnalysisEvent::Progress {
        id,
        generation,
        progress,
        message: "Connecting…",
    });

    let mut ticker = interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // an interval's first tick completes immediately; swallow it so the
    // first simulated step lands a full period after "Connecting…"
    ticker.tick().await;

    let request = engine.trigger_analysis(id);
    tokio::pin!(request);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let step = rand::thread_rng().gen_range(0..=MAX_TICK_INCREMENT);
                progress = advance(progress, step);
                let _ = events.send(AnalysisEvent::Progress {
                    id,
                    generation,
                    progress,
                    message: stage_message(progress),
                });
            }
            result = &mut request => {
                match result {
                    Ok(tender) => {
                        let _ = events.send(AnalysisEvent::Progress {
                            id,
                            generation,
                            progress: 100,
                            message: "Complete",
                        });
                        // keep 100% on screen long enough to be seen
                        sleep(SETTLE_DELAY).await;
                        let _ = events.send(AnalysisEvent::Completed {
                            id,
                            generation,
                            tender: Box::new(tender),
                        });
                    }
                    Err(error) => {
                        let _ = events.send(AnalysisEvent::Failed { id, generation, error });
                    }
                }
                break;
            }
        }
    }
}
