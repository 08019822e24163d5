//! Server integration tests
//!
//! Tests for HTTP endpoints and server functionality.

use axum::extract::State;
use axum::http::StatusCode;
use smc_exporter::cache::SnapshotCache;
use smc_exporter::config::MetricsConfig;
use smc_exporter::metrics::MetricsCollector;
use smc_exporter::server::{health_handler, metrics_handler, router, AppState};

/// Helper to create handler state over a fresh cache
fn create_test_state() -> AppState {
    let cache = SnapshotCache::new();
    let metrics = MetricsCollector::new(&MetricsConfig::default(), cache.clone())
        .expect("Failed to create metrics");
    AppState { metrics, cache }
}

#[tokio::test]
async fn test_health_is_unavailable_before_first_cycle() {
    // Given: No collection cycle has published yet
    let state = create_test_state();

    // When: Checking health
    let response = health_handler(State(state)).await;

    // Then: The exporter reports itself unavailable
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_health_is_ok_after_publish() {
    // Given: A cycle published an (empty) snapshot
    let state = create_test_state();
    state.cache.publish(Vec::new());

    // When: Checking health
    let response = health_handler(State(state)).await;

    // Then: The exporter is healthy even with no adapters
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_ok() {
    let state = create_test_state();

    let response = metrics_handler(State(state)).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn test_metrics_rendering_is_stable() {
    // Given: A registry over a published snapshot
    let state = create_test_state();
    state.cache.publish(Vec::new());
    state.metrics.up.set(1.0);

    // When: Rendering twice
    let render1 = state.metrics.render().expect("First render failed");
    let render2 = state.metrics.render().expect("Second render failed");

    // Then: Both renderings are identical
    assert_eq!(render1, render2, "Metrics rendering is not stable");
    assert!(render1.contains("# HELP"), "Missing HELP comment");
    assert!(render1.contains("# TYPE"), "Missing TYPE comment");
    assert!(render1.contains("smc_up 1"), "Missing up metric");
}

#[test]
fn test_router_builds() {
    let _router = router(create_test_state());
}
