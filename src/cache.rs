//! Snapshot Cache
//!
//! Holds the latest complete collection result. The collection loop is the
//! only writer; every `/metrics` scrape is a reader.
//!
//! # Guarantees
//!
//! - Readers get an `Arc` to a fully published snapshot and never wait for an
//!   in-flight collection cycle
//! - Publishing swaps the whole snapshot at once, so a reader never sees two
//!   generations mixed
//! - Generations only increase

use crate::mlxlink::PortMetrics;
use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

/// One generation of collected port metrics
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSnapshot {
    /// 0 for the empty snapshot served before the first cycle completes
    pub generation: u64,
    pub collected_at: Option<SystemTime>,
    pub ports: Vec<PortMetrics>,
}

impl CollectionSnapshot {
    pub fn empty() -> Self {
        Self {
            generation: 0,
            collected_at: None,
            ports: Vec::new(),
        }
    }
}

/// Shared handle to the current snapshot. Cloning shares the same cache.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    current: Arc<ArcSwap<CollectionSnapshot>>,
    writer: Arc<Mutex<()>>,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(CollectionSnapshot::empty())),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// The last completely published snapshot
    pub fn load(&self) -> Arc<CollectionSnapshot> {
        self.current.load_full()
    }

    /// Replace the current snapshot and return the new generation number
    pub fn publish(&self, ports: Vec<PortMetrics>) -> u64 {
        // Serializes writers only; readers go through the ArcSwap
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let generation = self.current.load().generation + 1;
        self.current.store(Arc::new(CollectionSnapshot {
            generation,
            collected_at: Some(SystemTime::now()),
            ports,
        }));
        generation
    }
}
