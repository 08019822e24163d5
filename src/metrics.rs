//! Prometheus Metrics Definitions
//!
//! This module owns the registry served on `/metrics`.
//!
//! # Metric Categories
//!
//! ## Port Metrics
//! - Link state, speed and width
//! - Module temperature, voltage and per-lane optics
//! - BER, error counters and FEC histogram
//!
//! These are projected from the snapshot cache on every scrape by
//! [`NicModuleProjection`], so they always show exactly one generation.
//!
//! ## Exporter Health
//! - `<ns>_up` and `<ns>_build_info`
//! - Adapters discovered, published and failed in the last cycle
//! - Cycle duration, completion time and snapshot generation
//!
//! # Metric Types
//!
//! - **Gauge**: Current value (e.g., cycle duration, temperature)
//! - **IntGaugeVec**: Integer gauge with labels (e.g., build info)
//! - **GaugeVec**: Gauge with labels (e.g., port metrics labeled by adapter)

use crate::cache::SnapshotCache;
use crate::collectors::CycleReport;
use crate::config::MetricsConfig;
use crate::projection::NicModuleProjection;
use prometheus::{Encoder, Gauge, GaugeVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Metrics registry for the exporter
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    pub up: Arc<Gauge>,
    pub build_info: Arc<IntGaugeVec>,

    // Collection cycle
    pub collection_adapters: Arc<GaugeVec>,
    pub collection_duration_seconds: Arc<Gauge>,
    pub last_collection_timestamp_seconds: Arc<Gauge>,
    pub snapshot_generation: Arc<Gauge>,
}

impl MetricsCollector {
    pub fn new(config: &MetricsConfig, cache: SnapshotCache) -> anyhow::Result<Self> {
        let registry = Registry::new();
        let namespace = config.namespace.as_str();

        let up = Gauge::with_opts(
            Opts::new(
                "up",
                "Whether the last cycle published data (0 when every discovered adapter failed)",
            )
            .namespace(namespace),
        )?;

        let build_info = IntGaugeVec::new(
            Opts::new("build_info", "Exporter build information").namespace(namespace),
            &["version"],
        )?;

        let collection_adapters = GaugeVec::new(
            Opts::new(
                "collection_adapters",
                "Adapters handled by the last collection cycle",
            )
            .namespace(namespace),
            &["state"],
        )?;

        let collection_duration_seconds = Gauge::with_opts(
            Opts::new(
                "collection_duration_seconds",
                "Duration of the last collection cycle",
            )
            .namespace(namespace),
        )?;

        let last_collection_timestamp_seconds = Gauge::with_opts(
            Opts::new(
                "last_collection_timestamp_seconds",
                "Unix time the last collection cycle completed",
            )
            .namespace(namespace),
        )?;

        let snapshot_generation = Gauge::with_opts(
            Opts::new(
                "snapshot_generation",
                "Generation number of the snapshot being served",
            )
            .namespace(namespace),
        )?;

        let projection = NicModuleProjection::new(namespace, &config.subsystem, cache)?;

        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(build_info.clone()))?;
        registry.register(Box::new(collection_adapters.clone()))?;
        registry.register(Box::new(collection_duration_seconds.clone()))?;
        registry.register(Box::new(last_collection_timestamp_seconds.clone()))?;
        registry.register(Box::new(snapshot_generation.clone()))?;
        registry.register(Box::new(projection))?;

        build_info
            .with_label_values(&[env!("CARGO_PKG_VERSION")])
            .set(1);

        Ok(Self {
            registry: Arc::new(registry),
            up: Arc::new(up),
            build_info: Arc::new(build_info),
            collection_adapters: Arc::new(collection_adapters),
            collection_duration_seconds: Arc::new(collection_duration_seconds),
            last_collection_timestamp_seconds: Arc::new(last_collection_timestamp_seconds),
            snapshot_generation: Arc::new(snapshot_generation),
        })
    }

    /// Update the exporter health gauges from a finished cycle
    pub fn record_cycle(&self, report: &CycleReport) {
        let healthy = report.enumerated && (report.discovered == 0 || report.published > 0);
        self.up.set(if healthy { 1.0 } else { 0.0 });

        self.collection_adapters
            .with_label_values(&["discovered"])
            .set(report.discovered as f64);
        self.collection_adapters
            .with_label_values(&["published"])
            .set(report.published as f64);
        self.collection_adapters
            .with_label_values(&["failed"])
            .set(report.failed as f64);

        self.collection_duration_seconds
            .set(report.duration.as_secs_f64());
        self.snapshot_generation.set(report.generation as f64);

        if let Ok(now) = SystemTime::now().duration_since(UNIX_EPOCH) {
            self.last_collection_timestamp_seconds
                .set(now.as_secs_f64());
        }
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
