//! Integration tests for the Crossborder LLM API.
//!
//! The router is exercised end to end against scripted chat models and
//! canned product pages. Tests against a live Azure OpenAI deployment are
//! ignored by default:
//! Run with: cargo test --test integration -- --ignored

mod api;
mod live;
mod marketing;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use crossborder_llm::api::{create_router, AppState};
use crossborder_llm::crawl::{JobStore, MockProductCrawler};
use crossborder_llm::llm::{ChatModel, MockChatModel};

/// Router over `model` (if any) and `crawler`.
pub fn app(model: Option<MockChatModel>, crawler: MockProductCrawler) -> Router {
    let model = model.map(|m| Arc::new(m) as Arc<dyn ChatModel>);
    create_router(AppState::new(model, JobStore::new(Arc::new(crawler))))
}

/// Send a request and decode the JSON answer.
pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
