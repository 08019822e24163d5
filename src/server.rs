//! HTTP Server and Collection Loop
//!
//! This module implements the Prometheus exporter HTTP server and the
//! background collection loop.
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing `/metrics`, `/health`, and `/` endpoints
//! - **Collection Loop**: Background task that runs one NIC collection cycle per interval
//! - **State Management**: Handlers share the metrics registry and snapshot cache
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - 200 once a cycle has published, 503 before that
//!
//! # Collection
//!
//! Scrapes never trigger a collection. The loop runs a cycle, waits for the
//! interval and repeats; a slow cycle delays the next tick instead of
//! overlapping with it. Scrapes in the meantime see the previous generation.

use crate::cache::SnapshotCache;
use crate::collectors::NicModuleCollector;
use crate::config::Config;
use crate::host::{CommandRunner, SystemCommandRunner};
use crate::metrics::MetricsCollector;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

/// State shared by the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub metrics: MetricsCollector,
    pub cache: SnapshotCache,
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let cache = SnapshotCache::new();
    let metrics = MetricsCollector::new(&config.metrics, cache.clone())?;
    let runner = SystemCommandRunner::new(config.tools.command_timeout());
    let collector = Arc::new(NicModuleCollector::new(
        runner,
        config.tools.clone(),
        &config.topology,
        cache.clone(),
    ));

    // Start background metrics collection
    let loop_metrics = metrics.clone();
    let period = Duration::from_secs(config.metrics.scrape_interval_seconds);
    tokio::spawn(async move {
        collect_metrics_loop(collector, loop_metrics, period).await;
    });

    let app = router(AppState { metrics, cache });

    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn collect_metrics_loop<R: CommandRunner>(
    collector: Arc<NicModuleCollector<R>>,
    metrics: MetricsCollector,
    period: Duration,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let report = collector.update_metrics().await;
        metrics.record_cycle(&report);
    }
}

async fn root_handler() -> impl IntoResponse {
    Html(
        r#"<html>
<head><title>SMC Exporter</title></head>
<body>
<h1>NIC Module Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

pub async fn health_handler(State(state): State<AppState>) -> Response {
    if state.cache.load().generation > 0 {
        (StatusCode::OK, "OK").into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "No collection cycle has completed yet",
        )
            .into_response()
    }
}
