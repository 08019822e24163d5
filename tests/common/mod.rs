//! Shared test helpers
//!
//! `ScriptedRunner` replays canned tool output keyed by the full command line,
//! so no test ever starts a real process.

#![allow(dead_code)]

use smc_exporter::error::{ExporterError, Result};
use smc_exporter::host::{AdapterIdentity, CommandOutput, CommandRunner, LinkMode, PciAddress};
use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

pub const ETH_OPTICAL_200G: &str = include_str!("../fixtures/mlxlink_eth_optical_200g.json");
pub const IB_COPPER: &str = include_str!("../fixtures/mlxlink_ib_copper.json");
pub const HISTOGRAM_UNSUPPORTED: &str =
    include_str!("../fixtures/mlxlink_histogram_unsupported.json");
pub const SLOT_REPORT: &str = include_str!("../fixtures/dmidecode_slots.txt");
pub const BUS_LISTING: &str = include_str!("../fixtures/lspci_d.txt");

/// Command runner that answers from a fixed script
#[derive(Default)]
pub struct ScriptedRunner {
    responses: HashMap<String, CommandOutput>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command_line` (program and arguments joined by spaces)
    pub fn respond(mut self, command_line: &str, output: CommandOutput) -> Self {
        self.responses.insert(command_line.to_string(), output);
        self
    }

    /// Answer the structured diagnostic call for `bus_address`
    pub fn respond_diagnostics(self, bus_address: &str, output: CommandOutput) -> Self {
        let command_line = format!(
            "mlxlink -d {} -m -c --rx_fec_histogram --show_histogram --json",
            bus_address
        );
        self.respond(&command_line, output)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let command_line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(command_line.clone());

        match self.responses.get(&command_line) {
            Some(output) => Ok(output.clone()),
            None => Err(ExporterError::Spawn {
                program: program.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "not scripted"),
            }),
        }
    }
}

pub fn address(raw: &str) -> PciAddress {
    raw.parse().expect("valid test address")
}

pub fn ethernet_identity(raw: &str) -> AdapterIdentity {
    let mut identity = AdapterIdentity::new(address(raw), LinkMode::Ethernet);
    identity.controller_name = Some("mlx5_0".to_string());
    identity.network_device_name = Some("ens1f0np0".to_string());
    identity
}

pub fn infiniband_identity(raw: &str) -> AdapterIdentity {
    let mut identity = AdapterIdentity::new(address(raw), LinkMode::Infiniband);
    identity.controller_name = Some("mlx5_2".to_string());
    identity.network_device_name = Some("ib0".to_string());
    identity
}
