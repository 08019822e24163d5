//! Host Topology Type Definitions
//!
//! Identity types shared by the topology resolver, the diagnostic decoder and
//! the metric projection.
//!
//! # Design Notes
//!
//! - **Join key**: [`PciAddress`] is the only key used to stitch together the
//!   bus listing, the sysfs symlink trees, the bonding state and the firmware
//!   slot inventory.
//! - **Generations**: [`AdapterIdentity`] and [`PhysicalSlot`] are rebuilt every
//!   collection cycle and never mutated afterwards.

use crate::error::{ExporterError, Result};
use std::fmt;
use std::str::FromStr;

/// Sentinel used for any label whose source value is missing or unusable
pub const UNKNOWN_LABEL: &str = "unknown";

/// Firmware placeholders that carry no identity
const PLACEHOLDER_VALUES: &[&str] = &[
    "not specified",
    "to be filled by o.e.m.",
    "default string",
    "n/a",
    "none",
];

/// Location of a PCI function: `segment:bus:device.function`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PciAddress {
    pub segment: u16,
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl PciAddress {
    pub fn new(segment: u16, bus: u8, device: u8, function: u8) -> Self {
        Self {
            segment,
            bus,
            device,
            function,
        }
    }

    /// The address of function 0 on the same device.
    ///
    /// Dual-port adapters expose their second port as function 1 while the
    /// firmware slot table only knows function 0.
    pub fn root_function(self) -> Self {
        Self {
            function: 0,
            ..self
        }
    }
}

impl fmt::Display for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x}",
            self.segment, self.bus, self.device, self.function
        )
    }
}

impl FromStr for PciAddress {
    type Err = ExporterError;

    /// Accepts `0000:17:00.1` and the short `17:00.1` form (segment 0)
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ExporterError::InvalidAddress(s.to_string());
        let trimmed = s.trim();

        let (location, function) = trimmed.rsplit_once('.').ok_or_else(invalid)?;
        let parts: Vec<&str> = location.split(':').collect();
        let (segment, bus, device) = match parts.as_slice() {
            [segment, bus, device] => (*segment, *bus, *device),
            [bus, device] => ("0", *bus, *device),
            _ => return Err(invalid()),
        };

        let segment = u16::from_str_radix(segment, 16).map_err(|_| invalid())?;
        let bus = u8::from_str_radix(bus, 16).map_err(|_| invalid())?;
        let device = u8::from_str_radix(device, 16).map_err(|_| invalid())?;
        let function = u8::from_str_radix(function, 16).map_err(|_| invalid())?;

        if device > 0x1f || function > 0x7 {
            return Err(invalid());
        }

        Ok(Self::new(segment, bus, device, function))
    }
}

/// Link layer the adapter runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkMode {
    Infiniband,
    Ethernet,
}

impl LinkMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkMode::Infiniband => "infiniband",
            LinkMode::Ethernet => "ethernet",
        }
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physical adapter port, as resolved for the current cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterIdentity {
    pub bus_address: PciAddress,
    pub mode: LinkMode,
    /// Name in the RDMA subsystem, e.g. `mlx5_0`
    pub controller_name: Option<String>,
    /// Name in the kernel network stack, e.g. `ens1f0np0`
    pub network_device_name: Option<String>,
    /// Infiniband partition key, only for partitioned fabrics
    pub partition_key: Option<String>,
}

impl AdapterIdentity {
    pub fn new(bus_address: PciAddress, mode: LinkMode) -> Self {
        Self {
            bus_address,
            mode,
            controller_name: None,
            network_device_name: None,
            partition_key: None,
        }
    }
}

/// One row of the firmware slot inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalSlot {
    pub designation: String,
    pub bus_address: Option<PciAddress>,
    pub slot_number: Option<u32>,
}

/// Normalize free text coming from tools or firmware into a label value.
///
/// Returns [`UNKNOWN_LABEL`] for empty text, text with control or replacement
/// characters, and well-known firmware placeholders.
pub fn label_or_unknown(raw: &str) -> String {
    let value = raw.trim();
    let printable = value
        .chars()
        .all(|c| !c.is_control() && c != char::REPLACEMENT_CHARACTER);

    if value.is_empty()
        || !printable
        || PLACEHOLDER_VALUES
            .iter()
            .any(|p| value.eq_ignore_ascii_case(p))
    {
        UNKNOWN_LABEL.to_string()
    } else {
        value.to_string()
    }
}

/// Same as [`label_or_unknown`] for optional values
pub fn optional_label(raw: Option<&str>) -> String {
    raw.map_or_else(|| UNKNOWN_LABEL.to_string(), label_or_unknown)
}
