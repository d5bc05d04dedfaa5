//! Service, metrics and crawl handlers, plus the shared application state.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::response::{ApiJson, ResponseModel};
use crate::crawl::{CrawlJob, JobStatus, JobStore};
use crate::error::{ApiError, LlmError};
use crate::llm::ChatModel;
use crate::workflow::{Workflow, DEFAULT_MATCH_THRESHOLD};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Chat model backing the workflow endpoints; `None` when not configured.
    pub model: Option<Arc<dyn ChatModel>>,
    /// Crawl job registry.
    pub jobs: JobStore,
    /// Prometheus handle for `/api/metrics`.
    pub metrics: Option<PrometheusHandle>,
    /// Match threshold used when a request omits one.
    pub match_threshold: f64,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("model", &self.model.as_ref().map(|m| m.model_id().to_string()))
            .field("jobs", &self.jobs)
            .field("metrics", &self.metrics.is_some())
            .field("match_threshold", &self.match_threshold)
            .finish()
    }
}

impl AppState {
    /// Create new app state.
    pub fn new(model: Option<Arc<dyn ChatModel>>, jobs: JobStore) -> Self {
        Self {
            model,
            jobs,
            metrics: None,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }

    /// Attach a Prometheus handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Override the default match threshold.
    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Workflow runner over the configured model, or 503.
    pub fn workflow(&self) -> Result<Workflow, ApiError> {
        self.model
            .clone()
            .map(Workflow::new)
            .ok_or_else(|| LlmError::NotConfigured.into())
    }
}

/// Health check payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthData {
    /// Always `"ok"`.
    pub status: String,
}

/// Version payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VersionData {
    /// Service version.
    pub version: String,
}

/// Health check handler - always returns 200.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Service is running", body = ResponseModel<HealthData>))
)]
pub async fn health() -> Json<ResponseModel<HealthData>> {
    Json(ResponseModel::ok(
        "Service is running",
        HealthData {
            status: "ok".to_string(),
        },
    ))
}

/// API version.
#[utoipa::path(
    get,
    path = "/api/version",
    tag = "Health",
    responses((status = 200, description = "Version information", body = ResponseModel<VersionData>))
)]
pub async fn version() -> Json<ResponseModel<VersionData>> {
    Json(ResponseModel::ok(
        "Version information",
        VersionData {
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    ))
}

/// Prometheus text exposition.
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            "metrics recorder not installed\n".to_string(),
        ),
    }
}

fn default_platform() -> String {
    "Amazon".to_string()
}

/// Crawl submission body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CrawlRequest {
    /// Product page URL.
    pub url: String,
    /// Marketplace name.
    #[serde(default = "default_platform")]
    pub platform: String,
}

/// Crawl submission acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CrawlSubmitted {
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
}

/// Crawl job lookup.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CrawlQuery {
    /// Job id returned on submission.
    pub job_id: Option<String>,
}

/// Submit a product page for crawling.
#[utoipa::path(
    post,
    path = "/api/products/crawl",
    tag = "Product",
    request_body = CrawlRequest,
    responses(
        (status = 200, description = "Crawl task submitted", body = ResponseModel<CrawlSubmitted>),
        (status = 422, description = "Invalid URL or body", body = crate::error::ErrorBody)
    )
)]
pub async fn submit_crawl(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CrawlRequest>,
) -> Result<Json<ResponseModel<CrawlSubmitted>>, ApiError> {
    let job = state.jobs.submit(&request.url, &request.platform)?;
    let message = "Crawl task submitted successfully.";
    info!(job_id = %job.job_id, "Crawl request accepted");

    Ok(Json(ResponseModel::ok(
        message,
        CrawlSubmitted {
            job_id: job.job_id,
            status: job.status,
            message: message.to_string(),
        },
    )))
}

/// Poll a crawl job.
#[utoipa::path(
    get,
    path = "/api/products/crawl",
    tag = "Product",
    params(CrawlQuery),
    responses(
        (status = 200, description = "Job snapshot", body = ResponseModel<CrawlJob>),
        (status = 404, description = "Job ID not found", body = crate::error::ErrorBody)
    )
)]
pub async fn get_crawl(
    State(state): State<AppState>,
    Query(query): Query<CrawlQuery>,
) -> Result<Json<ResponseModel<CrawlJob>>, ApiError> {
    let job_id = query
        .job_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Validation("job_id query parameter is required".to_string()))?;

    let job = state
        .jobs
        .get(&job_id)
        .ok_or_else(|| ApiError::NotFound("Job ID not found".to_string()))?;

    let message = format!("Job status: {}", job.status);
    Ok(Json(ResponseModel::ok(message, job)))
}
