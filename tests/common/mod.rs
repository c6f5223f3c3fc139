//! Shared test fixtures: an in-process `TenderApi` double with call
//! counters and programmable behavior.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use tenderctl::domain::error::{ApiError, ApiResult};
use tenderctl::domain::models::{
    Answer, AvisMetadata, Citation, FieldSource, Health, Lot, LotDeepData, ScraperRunReceipt,
    ScraperRunRequest, ScraperStatus, StopReceipt, Tender, TenderPage, TenderQuery, TenderStatus,
    TrackedValue, UniversalMetadata,
};
use tenderctl::domain::ports::TenderApi;

pub fn lot(number: Option<&str>, subject: &str) -> Lot {
    Lot {
        lot_number: number.map(str::to_string),
        subject: TrackedValue::extracted(subject.to_string(), FieldSource::Avis),
        ..Default::default()
    }
}

pub fn deep_lot(number: Option<&str>) -> LotDeepData {
    LotDeepData {
        lot_number: number.map(str::to_string),
        ..Default::default()
    }
}

pub fn avis_with_lots(lots: Vec<Lot>) -> AvisMetadata {
    AvisMetadata {
        reference_tender: TrackedValue::extracted("AO-2024-117".to_string(), FieldSource::Avis),
        subject: TrackedValue::extracted(
            "Fourniture de matériel informatique".to_string(),
            FieldSource::Website,
        ),
        lots,
        ..Default::default()
    }
}

pub fn make_tender(id: Uuid, status: TenderStatus, with_deep: bool) -> Tender {
    Tender {
        id,
        external_reference: Some("AO-2024-117".to_string()),
        source_url: "https://portal.example/consultation/117".to_string(),
        status,
        download_date: Some("2024-03-01".to_string()),
        avis_metadata: Some(avis_with_lots(vec![
            lot(Some("1"), "Serveurs"),
            lot(Some("2"), "Postes de travail"),
        ])),
        universal_metadata: with_deep.then(|| UniversalMetadata {
            lots: vec![deep_lot(Some("1")), deep_lot(Some("2"))],
            ..Default::default()
        }),
        documents: vec![],
        error_message: None,
        scraped_at: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn running_status(phase: &str) -> ScraperStatus {
    ScraperStatus {
        is_running: true,
        current_phase: phase.to_string(),
        total_tenders: 12,
        downloaded: 4,
        failed: 0,
        elapsed_seconds: 10.0,
        last_run: None,
        logs: None,
        stats: None,
    }
}

/// Programmable in-process backend double.
pub struct MockApi {
    pub tender_id: Uuid,

    pub health_ok: AtomicBool,
    pub analyze_fails: AtomicBool,
    pub analyze_delay: Mutex<Duration>,
    pub detail_delay: Mutex<Duration>,

    /// Scripted status snapshots; the last one repeats once drained.
    pub statuses: Mutex<VecDeque<ScraperStatus>>,

    pub health_calls: AtomicU32,
    pub list_calls: AtomicU32,
    pub detail_calls: AtomicU32,
    pub analyze_calls: AtomicU32,
    pub ask_calls: AtomicU32,
    pub run_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub stop_calls: AtomicU32,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            tender_id: Uuid::new_v4(),
            health_ok: AtomicBool::new(true),
            analyze_fails: AtomicBool::new(false),
            analyze_delay: Mutex::new(Duration::ZERO),
            detail_delay: Mutex::new(Duration::ZERO),
            statuses: Mutex::new(VecDeque::new()),
            health_calls: AtomicU32::new(0),
            list_calls: AtomicU32::new(0),
            detail_calls: AtomicU32::new(0),
            analyze_calls: AtomicU32::new(0),
            ask_calls: AtomicU32::new(0),
            run_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            stop_calls: AtomicU32::new(0),
        }
    }

    pub fn set_analyze_delay(&self, delay: Duration) {
        *self.analyze_delay.lock().unwrap() = delay;
    }

    pub fn set_detail_delay(&self, delay: Duration) {
        *self.detail_delay.lock().unwrap() = delay;
    }

    pub fn push_status(&self, status: ScraperStatus) {
        self.statuses.lock().unwrap().push_back(status);
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TenderApi for MockApi {
    async fn health(&self) -> ApiResult<Health> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        if self.health_ok.load(Ordering::SeqCst) {
            Ok(Health {
                status: "healthy".to_string(),
                version: "1.0.0".to_string(),
            })
        } else {
            Err(ApiError::from_status(503, ""))
        }
    }

    async fn list_tenders(&self, query: &TenderQuery) -> ApiResult<TenderPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let total: u64 = 47;
        let per_page = u64::from(query.per_page.max(1));
        Ok(TenderPage {
            items: vec![make_tender(self.tender_id, TenderStatus::Listed, false)],
            total,
            page: query.page,
            per_page: query.per_page,
            total_pages: u32::try_from(total.div_ceil(per_page)).unwrap(),
        })
    }

    async fn get_tender(&self, id: Uuid) -> ApiResult<Tender> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.detail_delay.lock().unwrap();
        if !delay.is_zero() {
            sleep(delay).await;
        }
        Ok(make_tender(id, TenderStatus::Listed, false))
    }

    async fn trigger_analysis(&self, id: Uuid) -> ApiResult<Tender> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.analyze_delay.lock().unwrap();
        if !delay.is_zero() {
            sleep(delay).await;
        }
        if self.analyze_fails.load(Ordering::SeqCst) {
            Err(ApiError::from_status(
                500,
                r#"{"detail": "Deep analysis failed"}"#,
            ))
        } else {
            Ok(make_tender(id, TenderStatus::Analyzed, true))
        }
    }

    async fn ask(&self, _id: Uuid, question: &str) -> ApiResult<Answer> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Answer {
            answer: format!("Answer to: {question}"),
            citations: vec![Citation {
                document: "CPS.pdf".to_string(),
                page: Some(12),
            }],
        })
    }

    async fn run_scraper(&self, request: &ScraperRunRequest) -> ApiResult<ScraperRunReceipt> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        let start = request.start_date.clone().unwrap_or_default();
        let end = request.end_date.clone().unwrap_or_else(|| start.clone());
        Ok(ScraperRunReceipt {
            job_id: Uuid::new_v4().to_string(),
            date_range: format!("{start} to {end}"),
            status: Some("started".to_string()),
        })
    }

    async fn scraper_status(&self) -> ApiResult<ScraperStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap())
        } else if let Some(last) = statuses.front() {
            Ok(last.clone())
        } else {
            Ok(ScraperStatus::idle())
        }
    }

    async fn stop_scraper(&self) -> ApiResult<StopReceipt> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StopReceipt {
            stopped: true,
            message: None,
        })
    }
}
