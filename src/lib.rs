//! NIC Module Prometheus Exporter
//!
//! A Prometheus metrics exporter for Mellanox/NVIDIA network adapters and the
//! transceiver modules plugged into them.
//!
//! # Overview
//!
//! Each collection cycle enumerates the adapters on the PCI bus, resolves
//! their controller, network device and physical slot, and runs the `mlxlink`
//! diagnostic tool against every adapter in parallel. The decoded link state,
//! optics and error counters are published as one snapshot that `/metrics`
//! serves until the next cycle completes.
//!
//! # Architecture
//!
//! ```text
//!  lspci / sysfs / dmidecode        ┌──────────────────────────────┐
//!  ──────────────────────────────►  │ collectors::NicModuleCollector│
//!  mlxlink (one task per adapter)   └──────────────┬───────────────┘
//!                                                  │ publish
//!                                          ┌───────▼───────┐
//!                                          │ SnapshotCache │
//!                                          └───────┬───────┘
//!                                                  │ load (per scrape)
//!  ┌────────────┐     /metrics      ┌──────────────▼──────────────┐
//!  │ Prometheus │ ◄──────────────── │ metrics + projection (axum) │
//!  └────────────┘                   └─────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`host`] - Bus enumeration, sysfs topology, slots and tool execution
//! - [`mlxlink`] - Diagnostic tool adapter and JSON decoding
//! - [`collectors`] - Collection cycle orchestration
//! - [`cache`] - Atomically published snapshots
//! - [`projection`] - Snapshot to Prometheus metric families
//! - [`metrics`] - Registry and exporter health metrics
//! - [`server`] - HTTP server and collection loop
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use smc_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod collectors;
pub mod config;
pub mod error;
pub mod host;
pub mod metrics;
pub mod mlxlink;
pub mod projection;
pub mod server;
