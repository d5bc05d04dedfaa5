//! HTTP API route definitions.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::docs::{openapi_json, redoc, swagger_ui, OPENAPI_PATH};
use super::handlers::{get_crawl, health, prometheus_metrics, submit_crawl, version, AppState};
use super::marketing::{
    analyze_influencers, analyze_intent, analyze_product, create_outreach, recommend_influencers,
    run_marketing,
};
use crate::metrics;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Service endpoints
        .route("/api/health", get(health))
        .route("/api/version", get(version))
        .route("/api/metrics", get(prometheus_metrics))
        // Documentation
        .route("/api/docs", get(swagger_ui))
        .route("/api/redoc", get(redoc))
        .route(OPENAPI_PATH, get(openapi_json))
        // Products
        .route("/api/products/crawl", post(submit_crawl).get(get_crawl))
        .route("/api/products/analyze", post(analyze_product))
        // Influencers
        .route("/api/influencers/analyze", post(analyze_influencers))
        .route("/api/influencers/recommend", post(recommend_influencers))
        // Outreach
        .route("/api/outreachs/create", post(create_outreach))
        .route("/api/outreachs/intent", post(analyze_intent))
        .route("/api/marketing/run", post(run_marketing))
        .layer(middleware::from_fn(track_latency))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Record request latency per matched route.
async fn track_latency(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_http_latency(start, &endpoint);
    response
}
