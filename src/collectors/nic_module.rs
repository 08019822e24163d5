//! NIC Module Collection Cycle
//!
//! One cycle runs `Discovering → Dispatching → Awaiting → Publishing`:
//!
//! 1. Enumerate adapters on the bus and resolve each one's identity and slot
//! 2. Spawn one diagnostic task per adapter
//! 3. Wait for every task; failures are logged and left out
//! 4. Publish all successful records as the next cache generation
//!
//! The cycle is driven by the server's interval timer and never returns an
//! error. Scrapes keep reading the previous generation while a cycle runs.
//! When the bus listing itself cannot be read, nothing is published and the
//! previous generation stays current.

use super::{collect_with_fallback, CycleReport};
use crate::cache::SnapshotCache;
use crate::config::{ToolsConfig, TopologyConfig};
use crate::error::Result;
use crate::host::slots::{parse_slot_inventory, slot_label};
use crate::host::topology::{parse_bus_listing, parse_ibdev2netdev, resolve_adapters};
use crate::host::{AdapterIdentity, CommandRunner, HostContext, SysfsLayout, TopologySnapshot};
use crate::mlxlink::{self, PortMetrics};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// An adapter ready for diagnosis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAdapter {
    pub identity: AdapterIdentity,
    pub slot: String,
}

/// Collects transceiver diagnostics for every monitored adapter
pub struct NicModuleCollector<R: CommandRunner> {
    runner: Arc<R>,
    tools: Arc<ToolsConfig>,
    layout: SysfsLayout,
    cache: SnapshotCache,
}

impl<R: CommandRunner> NicModuleCollector<R> {
    pub fn new(
        runner: R,
        tools: ToolsConfig,
        topology: &TopologyConfig,
        cache: SnapshotCache,
    ) -> Self {
        Self {
            runner: Arc::new(runner),
            tools: Arc::new(tools),
            layout: SysfsLayout::new(&topology.sysfs_root, &topology.procfs_root),
            cache,
        }
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    async fn run_tool(&self, program: &str, args: &[&str]) -> Result<String> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        self.runner
            .run(program, &args)
            .await
            .and_then(|output| output.into_stdout(program))
    }

    /// Enumerate adapters and resolve identity and slot for each
    ///
    /// Fails only when the bus listing cannot be read. An empty bus is
    /// `Ok(vec![])`.
    pub async fn discover(&self) -> Result<Vec<ResolvedAdapter>> {
        let listing = self.run_tool(&self.tools.lspci, &["-D"]).await?;
        let devices = parse_bus_listing(&listing, &self.tools.vendor);

        if devices.is_empty() {
            debug!("No {} adapters on the bus", self.tools.vendor);
            return Ok(Vec::new());
        }

        let ibdev_netdevs = collect_with_fallback(
            "controller to netdev map",
            self.run_tool(&self.tools.ibdev2netdev, &[]),
            |output| parse_ibdev2netdev(&output),
        )
        .await;

        let slots = collect_with_fallback(
            "slot inventory",
            self.run_tool(&self.tools.dmidecode, &["-t", "slot"]),
            |report| parse_slot_inventory(&report),
        )
        .await;

        let layout = self.layout.clone();
        let topology = tokio::task::spawn_blocking(move || TopologySnapshot::scan(&layout))
            .await
            .unwrap_or_else(|e| {
                warn!("Topology scan did not complete: {}", e);
                TopologySnapshot::default()
            });

        Ok(resolve_adapters(&devices, &topology, &ibdev_netdevs)
            .into_iter()
            .map(|identity| {
                let slot = slot_label(&slots, identity.bus_address);
                ResolvedAdapter { identity, slot }
            })
            .collect())
    }

    /// Start one diagnostic task per adapter
    fn dispatch(
        &self,
        adapters: Vec<ResolvedAdapter>,
        host: Arc<HostContext>,
    ) -> JoinSet<(AdapterIdentity, Result<PortMetrics>)> {
        let mut tasks = JoinSet::new();

        for adapter in adapters {
            let runner = Arc::clone(&self.runner);
            let tools = Arc::clone(&self.tools);
            let host = Arc::clone(&host);

            tasks.spawn(async move {
                let result = mlxlink::probe_port(
                    runner.as_ref(),
                    &tools.mlxlink,
                    &adapter.identity,
                    &host,
                    &adapter.slot,
                )
                .await;
                (adapter.identity, result)
            });
        }

        tasks
    }

    /// Collect exactly one result per task, keeping the successes
    async fn await_results(
        mut tasks: JoinSet<(AdapterIdentity, Result<PortMetrics>)>,
    ) -> (Vec<PortMetrics>, usize) {
        let mut ports = Vec::with_capacity(tasks.len());
        let mut failed = 0;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(port))) => ports.push(port),
                Ok((identity, Err(e))) => {
                    failed += 1;
                    warn!(
                        "Dropping {} ({}) for this cycle: {}",
                        identity.bus_address,
                        identity.controller_name.as_deref().unwrap_or("no controller"),
                        e
                    );
                }
                Err(e) => {
                    failed += 1;
                    error!("Diagnostic task did not complete: {}", e);
                }
            }
        }

        ports.sort_by_key(|port| port.bus_address);
        (ports, failed)
    }

    /// Run one full collection cycle and publish its result
    pub async fn update_metrics(&self) -> CycleReport {
        let started = Instant::now();

        let adapters = match self.discover().await {
            Ok(adapters) => adapters,
            Err(e) => {
                let generation = self.cache.load().generation;
                warn!(
                    "Failed to read bus listing, keeping generation {}: {}",
                    generation, e
                );
                return CycleReport {
                    generation,
                    enumerated: false,
                    discovered: 0,
                    published: 0,
                    failed: 0,
                    duration: started.elapsed(),
                };
            }
        };
        let discovered = adapters.len();
        debug!("Discovered {} adapters", discovered);

        let host = HostContext::discover(self.runner.as_ref(), &self.tools.dmidecode).await;
        let tasks = self.dispatch(adapters, Arc::new(host));
        let (ports, failed) = Self::await_results(tasks).await;

        let published = ports.len();
        let generation = self.cache.publish(ports);
        let duration = started.elapsed();

        info!(
            "Published generation {}: {} of {} adapters in {:.3}s",
            generation,
            published,
            discovered,
            duration.as_secs_f64()
        );

        CycleReport {
            generation,
            enumerated: true,
            discovered,
            published,
            failed,
            duration,
        }
    }
}
