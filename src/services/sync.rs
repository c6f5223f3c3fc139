//! Query/polling orchestrator.
//!
//! [`SyncEngine`] owns one [`ResourceCell`] per server resource and
//! keeps them fresh on independent cadences: health every 10s, the
//! current tender-list page every 30s, scraper status every 2s, and
//! tender details once per id change. Mutations go through the engine
//! so their cache-invalidation obligations cannot be forgotten at call
//! sites.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::error::{ApiError, ApiResult};
use crate::domain::models::{
    Answer, Health, PollingConfig, ScraperRunReceipt, ScraperRunRequest, ScraperStatus,
    StopReceipt, Tender, TenderPage, TenderQuery,
};
use crate::domain::ports::TenderApi;
use crate::services::cache::{CachedResult, ResourceCell};

/// Notifications emitted by the polling loop.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// The backend flipped between reachable and unreachable.
    OnlineChanged(bool),
    HealthUpdated(Arc<Health>),
    TenderListUpdated(Arc<TenderPage>),
    TenderListFailed(ApiError),
    ScraperStatusUpdated(Arc<ScraperStatus>),
    ScraperStatusFailed(ApiError),
}

/// Which resources a [`SyncEngine::run`] loop polls.
///
/// The health probe always runs; the list and scraper polls are opted
/// into by the views that need them.
#[derive(Debug, Clone, Copy)]
pub struct PollPlan {
    pub list: bool,
    pub scraper: bool,
}

impl PollPlan {
    pub fn dashboard() -> Self {
        Self {
            list: true,
            scraper: true,
        }
    }

    pub fn scraper_only() -> Self {
        Self {
            list: false,
            scraper: true,
        }
    }
}

/// The client's single shared cache and mutation gateway.
pub struct SyncEngine {
    api: Arc<dyn TenderApi>,
    polling: PollingConfig,

    health: ResourceCell<(), Health>,
    lists: ResourceCell<TenderQuery, TenderPage>,
    details: ResourceCell<Uuid, Tender>,
    scraper: ResourceCell<(), ScraperStatus>,

    online: AtomicBool,
    list_query: watch::Sender<TenderQuery>,
}

impl SyncEngine {
    pub fn new(api: Arc<dyn TenderApi>, polling: PollingConfig) -> Self {
        let (list_query, _) = watch::channel(TenderQuery::default());
        Self {
            api,
            polling,
            health: ResourceCell::new("health"),
            lists: ResourceCell::new("tender-list"),
            details: ResourceCell::new("tender-detail"),
            scraper: ResourceCell::new("scraper-status"),
            online: AtomicBool::new(true),
            list_query,
        }
    }

    /// Last observed reachability of the backend.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Change the list page/filters the poll loop keeps fresh. A new
    /// combination is a new cache key and fetches immediately.
    pub fn set_list_query(&self, query: TenderQuery) {
        self.list_query.send_replace(query);
    }

    pub fn current_list_query(&self) -> TenderQuery {
        self.list_query.borrow().clone()
    }

    // ---- reads -----------------------------------------------------

    /// One health probe, cached until the next poll refreshes it.
    pub async fn health(&self) -> CachedResult<Health> {
        let api = Arc::clone(&self.api);
        self.health
            .get_with((), move || async move { api.health().await })
            .await
    }

    /// The list page for `query`, fetched on first request per key.
    pub async fn tenders(&self, query: &TenderQuery) -> CachedResult<TenderPage> {
        let api = Arc::clone(&self.api);
        let q = query.clone();
        self.lists
            .get_with(query.clone(), move || async move {
                api.list_tenders(&q).await
            })
            .await
    }

    /// The full record for `id`. Fetched once per id; later calls are
    /// cache hits until a mutation invalidates the entry.
    pub async fn tender_detail(&self, id: Uuid) -> CachedResult<Tender> {
        let api = Arc::clone(&self.api);
        self.details
            .get_with(id, move || async move { api.get_tender(id).await })
            .await
    }

    pub async fn scraper_status(&self) -> CachedResult<ScraperStatus> {
        let api = Arc::clone(&self.api);
        self.scraper
            .get_with((), move || async move { api.scraper_status().await })
            .await
    }

    /// Re-fetch the scraper status ignoring the cached snapshot; the
    /// 2-second watch loops call this directly.
    pub async fn refresh_scraper_status(&self) -> CachedResult<ScraperStatus> {
        let api = Arc::clone(&self.api);
        self.scraper
            .refresh_with((), move || async move { api.scraper_status().await })
            .await
    }

    // ---- mutations and their invalidation obligations ---------------

    /// Start a scraper run. Invalidates: scraper-status.
    pub async fn run_scraper(&self, request: &ScraperRunRequest) -> ApiResult<ScraperRunReceipt> {
        let receipt = self.api.run_scraper(request).await?;
        info!(job_id = %receipt.job_id, "scraper run accepted");
        self.scraper.invalidate(&()).await;
        Ok(receipt)
    }

    /// Stop the scraper. Invalidates: scraper-status and every cached
    /// list page — stopping may have changed tender states already
    /// written.
    pub async fn stop_scraper(&self) -> ApiResult<StopReceipt> {
        let receipt = self.api.stop_scraper().await?;
        self.scraper.invalidate(&()).await;
        self.lists.invalidate_all().await;
        Ok(receipt)
    }

    /// Trigger deep analysis. Invalidates: the detail entry for `id`
    /// and every cached list page (aggregate counts depend on status).
    pub async fn trigger_analysis(&self, id: Uuid) -> ApiResult<Tender> {
        let tender = self.api.trigger_analysis(id).await?;
        self.details.invalidate(&id).await;
        self.lists.invalidate_all().await;
        Ok(tender)
    }

    /// Phase-3 question. Read-only side effect: no invalidation.
    pub async fn ask(&self, id: Uuid, question: &str) -> ApiResult<Answer> {
        self.api.ask(id, question).await
    }

    // ---- polling loop ----------------------------------------------

    /// Drive the cadence-based polls until `shutdown` flips to true.
    ///
    /// The timers fire independently: a failing health probe never
    /// stops the list or scraper polls. Query changes refetch the list
    /// immediately under its new key.
    pub async fn run(
        &self,
        plan: PollPlan,
        events: mpsc::UnboundedSender<SyncEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut health_tick = interval(Duration::from_secs(self.polling.health_interval_secs));
        let mut list_tick = interval(Duration::from_secs(self.polling.list_interval_secs));
        let mut scraper_tick = interval(Duration::from_secs(self.polling.scraper_interval_secs));
        for tick in [&mut health_tick, &mut list_tick, &mut scraper_tick] {
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        let mut query_rx = self.list_query.subscribe();

        loop {
            tokio::select! {
                _ = health_tick.tick() => {
                    self.poll_health(&events).await;
                }
                _ = list_tick.tick(), if plan.list => {
                    let query = query_rx.borrow_and_update().clone();
                    self.poll_list(query, &events).await;
                }
                changed = query_rx.changed(), if plan.list => {
                    if changed.is_err() {
                        break;
                    }
                    let query = query_rx.borrow_and_update().clone();
                    debug!("list query changed, fetching new key");
                    self.poll_list(query, &events).await;
                }
                _ = scraper_tick.tick(), if plan.scraper => {
                    self.poll_scraper(&events).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("sync loop shutting down");
                        break;
                    }
                }
            }

            if events.is_closed() {
                break;
            }
        }
    }

    async fn poll_health(&self, events: &mpsc::UnboundedSender<SyncEvent>) {
        let api = Arc::clone(&self.api);
        let result = self
            .health
            .refresh_with((), move || async move { api.health().await })
            .await;

        let now_online = result.is_ok();
        let was_online = self.online.swap(now_online, Ordering::AcqRel);
        if now_online != was_online {
            if now_online {
                info!("backend reachable again");
            } else {
                warn!("backend unreachable");
            }
            let _ = events.send(SyncEvent::OnlineChanged(now_online));
        }
        if let Ok(health) = result {
            let _ = events.send(SyncEvent::HealthUpdated(health));
        }
    }

    async fn poll_list(&self, query: TenderQuery, events: &mpsc::UnboundedSender<SyncEvent>) {
        let api = Arc::clone(&self.api);
        let q = query.clone();
        let result = self
            .lists
            .refresh_with(query, move || async move { api.list_tenders(&q).await })
            .await;
        let _ = events.send(match result {
            Ok(page) => SyncEvent::TenderListUpdated(page),
            Err(err) => SyncEvent::TenderListFailed(err),
        });
    }

    async fn poll_scraper(&self, events: &mpsc::UnboundedSender<SyncEvent>) {
        let result = self.refresh_scraper_status().await;
        let _ = events.send(match result {
            Ok(status) => SyncEvent::ScraperStatusUpdated(status),
            Err(err) => SyncEvent::ScraperStatusFailed(err),
        });
    }
}
