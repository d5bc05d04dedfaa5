//! Unified error types for the service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Unified error type for service startup.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// HTTP client construction error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Prometheus recorder could not be installed.
    #[error("metrics error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Errors raised while talking to the chat completion backend.
#[derive(Error, Debug)]
pub enum LlmError {
    /// HTTP transport failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("api error [{status}]: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message reported by the backend.
        message: String,
    },

    /// The completion had no message content.
    #[error("completion contained no content")]
    EmptyCompletion,

    /// The completion could not be parsed as the expected JSON.
    #[error("failed to parse model output: {reason}. Output preview: {preview}")]
    OutputParse {
        /// Why parsing failed.
        reason: String,
        /// First characters of the raw output.
        preview: String,
    },

    /// No backend is configured.
    #[error("llm backend is not configured")]
    NotConfigured,
}

/// Product crawl errors.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// The submitted URL is not an http(s) URL.
    #[error("invalid product url {url}: {reason}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
        /// Reason for rejection.
        reason: String,
    },

    /// The product page could not be fetched.
    #[error("failed to fetch {url}: {reason}")]
    FetchFailed {
        /// Product URL.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The page was fetched but had no recognizable product content.
    #[error("product page did not contain product details: {url}")]
    NoProductDetails {
        /// Product URL.
        url: String,
    },

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Error returned from HTTP handlers, rendered as `{"detail": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Request failed validation (422).
    #[error("{0}")]
    Validation(String),

    /// The upstream LLM produced no usable result (502).
    #[error("{0}")]
    Upstream(String),

    /// A required backend is not configured (503).
    #[error("{0}")]
    Unavailable(String),

    /// Anything else (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human readable description.
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }
        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured => ApiError::Unavailable(err.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<CrawlError> for ApiError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::InvalidUrl { .. } => ApiError::Validation(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
