//! HTTP client for the tender platform backend.
//!
//! Wraps reqwest with connection pooling, a typed error taxonomy, and
//! exponential-backoff retry for transient failures. The health probe
//! deliberately bypasses retry: its failure is the offline signal.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::error::{ApiError, ApiResult};
use crate::domain::models::{
    Answer, ApiConfig, Health, RetryConfig, ScraperRunReceipt, ScraperRunRequest, ScraperStatus,
    StopReceipt, Tender, TenderPage, TenderQuery,
};
use crate::domain::ports::TenderApi;

use super::retry::RetryPolicy;

/// HTTP client implementing [`TenderApi`] against the REST backend.
pub struct ApiClient {
    http: ReqwestClient,
    base_url: String,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Build a client from configuration.
    pub fn new(api: &ApiConfig, retry: &RetryConfig) -> ApiResult<Self> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::from(retry),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Map reqwest failures into the client taxonomy. A timeout is its
    /// own variant; everything else without a response is transport.
    fn map_send_error(err: &reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(err.to_string())
        }
    }

    /// Decode a response: non-2xx becomes `ApiError::Http` with the
    /// message read from `detail`/`message`, a bad body becomes
    /// `ApiError::Decode`.
    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status.as_u16(), &body);
            warn!("API error: {err}");
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        debug!("GET {path}");
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;
        Self::decode(response).await
    }

    async fn get_json_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ApiResult<T> {
        debug!("GET {path} (with query)");
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;
        Self::decode(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        debug!("POST {path}");
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;
        Self::decode(response).await
    }
}

#[async_trait]
impl TenderApi for ApiClient {
    async fn health(&self) -> ApiResult<Health> {
        // No retry: a failed probe surfaces the offline state.
        self.get_json("/health").await
    }

    async fn list_tenders(&self, query: &TenderQuery) -> ApiResult<TenderPage> {
        self.retry
            .execute(|| self.get_json_with_query("/api/tenders", query))
            .await
    }

    async fn get_tender(&self, id: Uuid) -> ApiResult<Tender> {
        let path = format!("/api/tenders/{id}");
        self.retry.execute(|| self.get_json(&path)).await
    }

    async fn trigger_analysis(&self, id: Uuid) -> ApiResult<Tender> {
        let path = format!("/api/tenders/{id}/analyze");
        let body = serde_json::json!({});
        self.retry.execute(|| self.post_json(&path, &body)).await
    }

    async fn ask(&self, id: Uuid, question: &str) -> ApiResult<Answer> {
        let path = format!("/api/tenders/{id}/ask");
        let body = serde_json::json!({ "question": question });
        self.retry.execute(|| self.post_json(&path, &body)).await
    }

    async fn run_scraper(&self, request: &ScraperRunRequest) -> ApiResult<ScraperRunReceipt> {
        self.retry
            .execute(|| self.post_json("/api/scraper/run", request))
            .await
    }

    async fn scraper_status(&self) -> ApiResult<ScraperStatus> {
        self.retry
            .execute(|| self.get_json("/api/scraper/status"))
            .await
    }

    async fn stop_scraper(&self) -> ApiResult<StopReceipt> {
        let body = serde_json::json!({});
        self.retry
            .execute(|| self.post_json("/api/scraper/stop", &body))
            .await
    }
}
