//! Port traits: seams between the domain and the outside world.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::error::ApiResult;
use crate::domain::models::{
    Answer, Health, ScraperRunReceipt, ScraperRunRequest, ScraperStatus, StopReceipt, Tender,
    TenderPage, TenderQuery,
};

/// The tender platform's REST surface as the client consumes it.
///
/// Implementations must resolve every call to the uniform
/// `ApiResult` shape; no transport failure may escape as a panic.
#[async_trait]
pub trait TenderApi: Send + Sync {
    /// `GET /health`. Never retried: a failed probe is the offline signal.
    async fn health(&self) -> ApiResult<Health>;

    /// `GET /api/tenders` with filters and pagination.
    async fn list_tenders(&self, query: &TenderQuery) -> ApiResult<TenderPage>;

    /// `GET /api/tenders/{id}` including documents and phase metadata.
    async fn get_tender(&self, id: Uuid) -> ApiResult<Tender>;

    /// `POST /api/tenders/{id}/analyze`; resolves to the updated record.
    async fn trigger_analysis(&self, id: Uuid) -> ApiResult<Tender>;

    /// `POST /api/tenders/{id}/ask` (phase 3, read-only side effect).
    async fn ask(&self, id: Uuid, question: &str) -> ApiResult<Answer>;

    /// `POST /api/scraper/run` over a date range.
    async fn run_scraper(&self, request: &ScraperRunRequest) -> ApiResult<ScraperRunReceipt>;

    /// `GET /api/scraper/status`.
    async fn scraper_status(&self) -> ApiResult<ScraperStatus>;

    /// `POST /api/scraper/stop`.
    async fn stop_scraper(&self) -> ApiResult<StopReceipt>;
}
