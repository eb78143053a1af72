//! Shared helpers for orchestrator API tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use orchestrator::api;
use orchestrator::scheduler::{OperationLatency, Scheduler};
use orchestrator::AppState;

pub fn setup_test_app() -> (axum::Router, Arc<AppState>) {
    let scheduler = Scheduler::new(OperationLatency::uniform(Duration::from_millis(1)));
    let state = Arc::new(AppState::new(Arc::new(scheduler)));
    let app = api::router().with_state(Arc::clone(&state));
    (app, state)
}

pub async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(req).await.expect("request failed");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    (status, body.to_vec())
}

pub async fn json_response(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, req).await;
    let value: Value = serde_json::from_slice(&body).expect("invalid json");
    (status, value)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
