//! Adapter Topology Resolution
//!
//! Stitches several independent views of the host into one identity per
//! physical port:
//!
//! 1. The bus listing (`lspci -D`) names the adapters and their link mode
//! 2. `<sysfs>/class/infiniband/*/device` maps controller names to bus addresses
//! 3. `<sysfs>/class/net/*/device` maps network device names to bus addresses
//! 4. `ibdev2netdev` maps controller names to network device names
//! 5. `<procfs>/net/bonding` plus `bonding/slaves` expands bonds into ports
//!
//! # Failure Policy
//!
//! A missing directory, unreadable symlink or unparsable entry only blanks
//! the affected field. Resolution of the other adapters always continues.

use super::types::{AdapterIdentity, LinkMode, PciAddress};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const INFINIBAND_CLASS: &str = "Infiniband controller";
const ETHERNET_CLASS: &str = "Ethernet controller";

/// Partition keys that mean "member of the default partition"
const DEFAULT_PARTITION_KEYS: &[&str] = &["0xffff", "0x7fff"];

/// Root directories the resolver reads from
#[derive(Debug, Clone)]
pub struct SysfsLayout {
    sysfs_root: PathBuf,
    procfs_root: PathBuf,
}

impl SysfsLayout {
    pub fn new(sysfs_root: impl Into<PathBuf>, procfs_root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: sysfs_root.into(),
            procfs_root: procfs_root.into(),
        }
    }

    pub fn infiniband_class(&self) -> PathBuf {
        self.sysfs_root.join("class/infiniband")
    }

    pub fn net_class(&self) -> PathBuf {
        self.sysfs_root.join("class/net")
    }

    pub fn bonding_dir(&self) -> PathBuf {
        self.procfs_root.join("net/bonding")
    }

    fn bond_slaves_file(&self, bond: &str) -> PathBuf {
        self.net_class().join(bond).join("bonding/slaves")
    }

    fn partition_key_file(&self, netdev: &str) -> PathBuf {
        self.net_class().join(netdev).join("pkey")
    }
}

/// One adapter function selected from the bus listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusDevice {
    pub bus_address: PciAddress,
    pub mode: LinkMode,
}

/// Select the target vendor's Infiniband and Ethernet controllers from
/// `lspci -D` output
pub fn parse_bus_listing(listing: &str, vendor: &str) -> Vec<BusDevice> {
    let vendor = vendor.to_ascii_lowercase();

    listing
        .lines()
        .filter_map(|line| {
            let (address, description) = line.trim().split_once(char::is_whitespace)?;
            let (class, device) = description.split_once(':')?;

            let mode = if class.contains(INFINIBAND_CLASS) {
                LinkMode::Infiniband
            } else if class.contains(ETHERNET_CLASS) {
                LinkMode::Ethernet
            } else {
                return None;
            };

            if !device.to_ascii_lowercase().contains(&vendor) {
                return None;
            }

            match address.parse() {
                Ok(bus_address) => Some(BusDevice { bus_address, mode }),
                Err(e) => {
                    debug!("Skipping bus listing line {:?}: {}", line, e);
                    None
                }
            }
        })
        .collect()
}

/// Parse `ibdev2netdev` output (`mlx5_0 port 1 ==> ib0 (Up)`) into
/// controller name → network device name
pub fn parse_ibdev2netdev(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| {
            let (controller, netdev) = line.split_once("==>")?;
            let controller = controller.split_whitespace().next()?;
            let netdev = netdev.split_whitespace().next()?;
            Some((controller.to_string(), netdev.to_string()))
        })
        .collect()
}

/// Map every entry of a device class directory to the bus address its
/// `device` symlink points at. Virtual entries without a link are skipped.
pub fn read_device_links(class_dir: &Path) -> BTreeMap<String, PciAddress> {
    let entries = match fs::read_dir(class_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot read {}: {}", class_dir.display(), e);
            return BTreeMap::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let target = fs::read_link(entry.path().join("device")).ok()?;
            let address = target.file_name()?.to_str()?.parse().ok()?;
            Some((name, address))
        })
        .collect()
}

/// Everything read from sysfs/procfs for one cycle
#[derive(Debug, Clone, Default)]
pub struct TopologySnapshot {
    /// Controller name → bus address
    pub controllers: BTreeMap<String, PciAddress>,
    /// Network device name → bus address
    pub netdevs: BTreeMap<String, PciAddress>,
    /// Bond name → slave network devices, `None` when bonding is not loaded
    pub bonds: Option<BTreeMap<String, Vec<String>>>,
    /// Network device name → non-default partition key
    pub partition_keys: BTreeMap<String, String>,
}

impl TopologySnapshot {
    /// Read the symlink trees, bonding state and partition keys
    pub fn scan(layout: &SysfsLayout) -> Self {
        let controllers = read_device_links(&layout.infiniband_class());
        let netdevs = read_device_links(&layout.net_class());
        let bonds = read_bonds(layout);

        let partition_keys = netdevs
            .keys()
            .filter_map(|netdev| {
                let raw = fs::read_to_string(layout.partition_key_file(netdev)).ok()?;
                let key = raw.trim().to_ascii_lowercase();
                if key.is_empty() || DEFAULT_PARTITION_KEYS.contains(&key.as_str()) {
                    None
                } else {
                    Some((netdev.clone(), key))
                }
            })
            .collect();

        debug!(
            "Topology scan: {} controllers, {} netdevs, {} bonds",
            controllers.len(),
            netdevs.len(),
            bonds.as_ref().map_or(0, BTreeMap::len)
        );

        Self {
            controllers,
            netdevs,
            bonds,
            partition_keys,
        }
    }

    fn bond_slaves(&self, netdev: &str) -> Option<&[String]> {
        self.bonds
            .as_ref()?
            .get(netdev)
            .map(Vec::as_slice)
            .filter(|slaves| !slaves.is_empty())
    }
}

fn read_bonds(layout: &SysfsLayout) -> Option<BTreeMap<String, Vec<String>>> {
    let entries = fs::read_dir(layout.bonding_dir()).ok()?;

    let bonds = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let bond = entry.file_name().to_string_lossy().into_owned();
            let slaves = match fs::read_to_string(layout.bond_slaves_file(&bond)) {
                Ok(raw) => raw.split_whitespace().map(str::to_string).collect(),
                Err(e) => {
                    debug!("Cannot read slaves of bond {}: {}", bond, e);
                    Vec::new()
                }
            };
            (bond, slaves)
        })
        .collect();

    Some(bonds)
}

/// Invert a name → address map. Names are visited in sorted order, and a
/// plain name (`ib0`) is preferred over a partition child (`ib0.8001`).
fn names_by_address(map: &BTreeMap<String, PciAddress>) -> BTreeMap<PciAddress, &str> {
    let mut inverted: BTreeMap<PciAddress, &str> = BTreeMap::new();
    for (name, address) in map {
        match inverted.get(address) {
            Some(existing) if !existing.contains('.') || name.contains('.') => {}
            _ => {
                inverted.insert(*address, name.as_str());
            }
        }
    }
    inverted
}

/// Build one identity per physical port, ordered by bus address.
///
/// A device whose network device is a bond is replaced by one identity per
/// bond slave, each carrying the slave's own bus address.
pub fn resolve_adapters(
    devices: &[BusDevice],
    topology: &TopologySnapshot,
    ibdev_netdevs: &HashMap<String, String>,
) -> Vec<AdapterIdentity> {
    let modes: BTreeMap<PciAddress, LinkMode> =
        devices.iter().map(|d| (d.bus_address, d.mode)).collect();
    let controller_by_bus = names_by_address(&topology.controllers);
    let netdev_by_bus = names_by_address(&topology.netdevs);

    let mut resolved: BTreeMap<PciAddress, AdapterIdentity> = BTreeMap::new();

    for device in devices {
        let controller = controller_by_bus.get(&device.bus_address).copied();
        let netdev = controller
            .and_then(|c| ibdev_netdevs.get(c).map(String::as_str))
            .or_else(|| netdev_by_bus.get(&device.bus_address).copied());

        if controller.is_none() {
            debug!("No controller linked to {}", device.bus_address);
        }

        let ports: Vec<(PciAddress, Option<&str>)> =
            match netdev.and_then(|n| topology.bond_slaves(n)) {
                Some(slaves) => slaves
                    .iter()
                    .filter_map(|slave| match topology.netdevs.get(slave) {
                        Some(address) => Some((*address, Some(slave.as_str()))),
                        None => {
                            debug!("Bond slave {} has no bus address", slave);
                            None
                        }
                    })
                    .collect(),
                None => vec![(device.bus_address, netdev)],
            };

        for (bus_address, port_netdev) in ports {
            let mode = modes.get(&bus_address).copied().unwrap_or(device.mode);
            let partition_key = match (mode, port_netdev) {
                (LinkMode::Infiniband, Some(n)) => topology.partition_keys.get(n).cloned(),
                _ => None,
            };

            let port_controller = if bus_address == device.bus_address {
                controller
            } else {
                controller_by_bus.get(&bus_address).copied()
            };

            let identity = AdapterIdentity {
                bus_address,
                mode,
                controller_name: port_controller.map(str::to_string),
                network_device_name: port_netdev.map(str::to_string),
                partition_key,
            };

            match resolved.get(&bus_address) {
                Some(existing)
                    if existing.controller_name.is_some()
                        || identity.controller_name.is_none() => {}
                _ => {
                    resolved.insert(bus_address, identity);
                }
            }
        }
    }

    resolved.into_values().collect()
}
