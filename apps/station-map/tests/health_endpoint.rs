//! Health Endpoint Integration Tests
//!
//! Exercises the HTTP routes against dispatcher statistics.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use station_map::infrastructure::health::router;
use station_map::{
    DispatchStats, HealthServerState, InMemoryMapDocument, Station, StationState,
    StationStateForTrain, StationStateUpdate, SvgMapDocument, Train, UpdateDispatcher,
};

async fn get(state: Arc<HealthServerState>, uri: &str) -> (StatusCode, String) {
    let response = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn liveness_is_always_ok() {
    let state = Arc::new(HealthServerState::new("test", Arc::new(DispatchStats::new())));
    let (status, body) = get(state, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn not_ready_without_markers() {
    let stats = Arc::new(DispatchStats::new());
    let _dispatcher = UpdateDispatcher::with_stats(InMemoryMapDocument::new(), Arc::clone(&stats));
    let state = Arc::new(HealthServerState::new("test", stats));

    let (status, body) = get(Arc::clone(&state), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "NOT READY");

    let (status, body) = get(state, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "unhealthy");
}

#[tokio::test]
async fn health_reports_render_progress() {
    let stats = Arc::new(DispatchStats::new());
    let mut dispatcher =
        UpdateDispatcher::with_stats(SvgMapDocument::bundled().unwrap(), Arc::clone(&stats));
    dispatcher.apply(&StationStateUpdate::new(
        Station::LaCrosse,
        vec![StationStateForTrain::new(Train::EmpireBuilder, StationState::Incoming)],
    ));
    let state = Arc::new(HealthServerState::new("0.1.0-test", stats));

    let (status, body) = get(Arc::clone(&state), "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "READY");

    let (status, body) = get(state, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], "0.1.0-test");
    assert_eq!(json["markers"]["resolved"], 12);
    assert_eq!(json["updates"]["received"], 1);
    assert_eq!(json["updates"]["applied"], 1);
    assert_eq!(json["last_applied"]["station"], "LSE");
    assert_eq!(json["last_applied"]["class"], "EmpireBuilderIncoming");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let state = Arc::new(HealthServerState::new("test", Arc::new(DispatchStats::new())));
    let (status, _) = get(state, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
