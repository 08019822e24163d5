//! Snapshot cache tests

use smc_exporter::cache::SnapshotCache;
use smc_exporter::host::{AdapterIdentity, HostContext, LinkMode, PciAddress};
use smc_exporter::mlxlink::PortMetrics;
use std::sync::Arc;
use std::thread;

fn ports(count: usize) -> Vec<PortMetrics> {
    (0..count)
        .map(|i| {
            let identity =
                AdapterIdentity::new(PciAddress::new(0, 0x17, 0, i as u8 % 8), LinkMode::Ethernet);
            PortMetrics::new(&identity, &HostContext::default(), "1")
        })
        .collect()
}

#[test]
fn test_new_cache_serves_empty_generation_zero() {
    let cache = SnapshotCache::new();

    let snapshot = cache.load();

    assert_eq!(snapshot.generation, 0);
    assert!(snapshot.collected_at.is_none());
    assert!(snapshot.ports.is_empty());
}

#[test]
fn test_publish_replaces_snapshot() {
    let cache = SnapshotCache::new();

    let generation = cache.publish(ports(2));

    let snapshot = cache.load();
    assert_eq!(generation, 1);
    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.ports.len(), 2);
    assert!(snapshot.collected_at.is_some());
}

#[test]
fn test_held_snapshot_is_not_modified_by_publish() {
    // Given: A reader holding generation 1
    let cache = SnapshotCache::new();
    cache.publish(ports(1));
    let held = cache.load();

    // When: The writer publishes generation 2
    cache.publish(ports(3));

    // Then: The held snapshot is unchanged and new reads see generation 2
    assert_eq!(held.generation, 1);
    assert_eq!(held.ports.len(), 1);
    assert_eq!(cache.load().generation, 2);
    assert_eq!(cache.load().ports.len(), 3);
}

#[test]
fn test_clones_share_the_current_snapshot() {
    let cache = SnapshotCache::new();
    let reader = cache.clone();

    cache.publish(ports(1));

    assert_eq!(reader.load().generation, 1);
}

#[test]
fn test_concurrent_readers_see_complete_monotonic_generations() {
    // Given: Generation n always holds n - 1 ports
    let cache = SnapshotCache::new();
    let writer = cache.clone();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            thread::spawn(move || {
                let mut last = 0;
                for _ in 0..2_000 {
                    let snapshot = cache.load();
                    assert!(snapshot.generation >= last, "generation went backwards");
                    if snapshot.generation > 0 {
                        assert_eq!(snapshot.ports.len() as u64, snapshot.generation - 1);
                    }
                    last = snapshot.generation;
                }
            })
        })
        .collect();

    // When: The writer publishes while readers are loading
    for i in 0..200 {
        writer.publish(ports(i));
    }

    // Then: No reader observed a partial or older snapshot
    for reader in readers {
        reader.join().expect("reader thread panicked");
    }
    assert_eq!(cache.load().generation, 200);
}

#[test]
fn test_load_returns_shared_arc() {
    let cache = SnapshotCache::new();
    cache.publish(ports(1));

    let first = cache.load();
    let second = cache.load();

    assert!(Arc::ptr_eq(&first, &second));
}
