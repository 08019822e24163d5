//! Metrics Collectors
//!
//! A collector runs one full collection cycle and publishes its result into
//! the [`SnapshotCache`](crate::cache::SnapshotCache). Scrapes never call a
//! collector directly.
//!
//! # Error Handling
//!
//! Collectors never fail as a whole. A collaborator tool that cannot be run
//! degrades to an empty input for that cycle (see [`collect_with_fallback`]),
//! and a failing adapter only removes that adapter from the published set.
//! If the bus listing cannot be read the cycle publishes nothing.

use std::time::Duration;
use tracing::{debug, warn};

pub mod nic_module;

pub use nic_module::{NicModuleCollector, ResolvedAdapter};

/// Outcome of one collection cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Generation number the cycle published
    pub generation: u64,
    /// Whether the bus listing could be read. When false nothing was published
    /// and `generation` is the one still being served.
    pub enumerated: bool,
    pub discovered: usize,
    pub published: usize,
    pub failed: usize,
    pub duration: Duration,
}

/// Fetch a collaborator's output and parse it, falling back to the empty
/// value when the source cannot be read
///
/// # Arguments
///
/// * `name` - Name of the source (for logging)
/// * `query_future` - Async call returning the raw text
/// * `parse` - Turns the raw text into the parsed value
///
/// # Examples
///
/// ```no_run
/// # use smc_exporter::collectors::collect_with_fallback;
/// # use smc_exporter::host::slots::parse_slot_inventory;
/// # async fn example() {
/// let slots = collect_with_fallback(
///     "slot inventory",
///     async { Ok::<_, std::io::Error>(String::from("System Slot Information")) },
///     |report| parse_slot_inventory(&report),
/// )
/// .await;
/// # }
/// ```
pub async fn collect_with_fallback<T, F, P, E>(name: &str, query_future: F, parse: P) -> T
where
    F: std::future::Future<Output = Result<String, E>>,
    E: std::fmt::Display,
    P: FnOnce(String) -> T,
    T: Default,
{
    match query_future.await {
        Ok(raw) => {
            debug!("Read {}", name);
            parse(raw)
        }
        Err(e) => {
            warn!("Failed to read {}: {}", name, e);
            T::default()
        }
    }
}
