//! Service and crawl endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use metrics_exporter_prometheus::PrometheusBuilder;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use crossborder_llm::api::{create_router, AppState};
use crossborder_llm::crawl::{JobStore, MockProductCrawler};
use crossborder_llm::metrics::{self, METRIC_CRAWL_SUBMITTED, METRIC_LLM_CALLS};

use crate::{app, call};

const PRODUCT_URL: &str = "https://www.amazon.com/Datacolor-Spyder-Print/dp/B000I0DBH6";

const PRODUCT_PAGE: &str = r#"<html><body>
<span id="productTitle">Datacolor Spyder Print</span>
<span class="a-price"><span class="a-offscreen">$189.99</span></span>
<span id="acrCustomerReviewText">312 ratings</span>
<div id="feature-bullets"><ul><li><span class="a-list-item">Printer calibration</span></li></ul></div>
</body></html>"#;

async fn poll_until_finished(app: &axum::Router, job_id: &str) -> Value {
    for _ in 0..200 {
        let (status, body) = call(
            app,
            Method::GET,
            &format!("/api/products/crawl?job_id={job_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let job_status = body["data"]["status"].as_str().unwrap_or_default().to_string();
        if job_status == "completed" || job_status == "failed" {
            return body["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("crawl job {job_id} did not finish");
}

#[tokio::test]
async fn health_and_version() {
    let app = app(None, MockProductCrawler::new());

    let (status, body) = call(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("ok"));

    let (status, body) = call(&app, Method::GET, "/api/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["data"]["version"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn crawl_job_completes_with_product_details() {
    let app = app(
        None,
        MockProductCrawler::new()
            .with_page(PRODUCT_URL, PRODUCT_PAGE)
            .with_delay(Duration::from_millis(20)),
    );

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/products/crawl",
        Some(json!({"url": PRODUCT_URL, "platform": "Amazon"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["message"], json!("Crawl task submitted successfully."));
    assert_eq!(body["data"]["status"], json!("pending"));
    let job_id = body["data"]["jobId"].as_str().unwrap().to_string();

    let job = poll_until_finished(&app, &job_id).await;
    assert_eq!(job["status"], json!("completed"));
    assert_eq!(job["url"], json!(PRODUCT_URL));
    let result = &job["result"];
    assert_eq!(result["product_title"], json!("Datacolor Spyder Print"));
    assert_eq!(result["asin"], json!("B000I0DBH6"));
    assert_eq!(result["price"], json!("$189.99"));
    assert_eq!(result["review_count"], json!("312"));
    assert_eq!(result["features"], json!("Printer calibration"));
    assert!(result.get("error").is_none());
}

#[tokio::test]
async fn crawl_job_failure_is_reported() {
    let app = app(None, MockProductCrawler::new());

    let (_, body) = call(
        &app,
        Method::POST,
        "/api/products/crawl",
        Some(json!({"url": PRODUCT_URL})),
    )
    .await;
    let job_id = body["data"]["jobId"].as_str().unwrap().to_string();

    let job = poll_until_finished(&app, &job_id).await;
    assert_eq!(job["status"], json!("failed"));
    assert_eq!(job["platform"], json!("Amazon"));
    assert!(job["message"].as_str().unwrap().contains(PRODUCT_URL));
    assert_eq!(job["result"]["product_url"], json!(PRODUCT_URL));
    assert!(job["result"]["error"].is_string());
}

#[tokio::test]
async fn crawl_lookup_requires_known_job() {
    let app = app(None, MockProductCrawler::new());

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/products/crawl?job_id=00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Job ID not found"}));

    let (status, _) = call(&app, Method::GET, "/api/products/crawl", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn openapi_document_has_tags() {
    let app = app(None, MockProductCrawler::new());

    let (status, body) = call(&app, Method::GET, "/api/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["version"], json!(env!("CARGO_PKG_VERSION")));
    let tags: Vec<&str> = body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(tags, vec!["Health", "Product", "Influencer", "Outreach", "Marketing"]);
    assert!(body["paths"]["/api/products/crawl"]["get"].is_object());
    assert!(body["paths"]["/api/products/crawl"]["post"].is_object());
}

#[tokio::test]
async fn metrics_without_recorder_is_unavailable() {
    let app = app(None, MockProductCrawler::new());
    let (status, _) = call(&app, Method::GET, "/api/metrics", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn metrics_renders_prometheus_text() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    ::metrics::with_local_recorder(&recorder, || {
        metrics::inc_llm_calls();
        metrics::inc_crawl_submitted();
    });

    let state = AppState::new(None, JobStore::new(Arc::new(MockProductCrawler::new())))
        .with_metrics(handle);
    let request = Request::builder()
        .uri("/api/metrics")
        .body(Body::empty())
        .unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; version=0.0.4"
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains(&format!("{METRIC_LLM_CALLS} 1")), "{text}");
    assert!(text.contains(&format!("{METRIC_CRAWL_SUBMITTED} 1")), "{text}");
}
