use crate::host::types::{optional_label, AdapterIdentity, LinkMode, PciAddress, UNKNOWN_LABEL};
use crate::host::HostContext;
use std::collections::BTreeMap;

/// Cable family reported by the module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CableType {
    Optical,
    Copper,
    #[default]
    Unknown,
}

impl CableType {
    /// Classify the free text of the `Cable Type` field
    pub fn from_description(description: &str) -> Self {
        let description = description.to_ascii_lowercase();
        if description.contains("optic") {
            CableType::Optical
        } else if description.contains("copper") {
            CableType::Copper
        } else {
            CableType::Unknown
        }
    }
}

/// Decoded diagnostics for one adapter port.
///
/// Numeric fields the tool did not report stay at zero; label fields hold
/// [`UNKNOWN_LABEL`] instead of empty or unusable text.
#[derive(Debug, Clone, PartialEq)]
pub struct PortMetrics {
    pub bus_address: PciAddress,
    pub mode: LinkMode,
    pub controller_name: String,
    pub network_device_name: String,
    pub partition_key: String,
    pub hostname: String,
    pub system_serial: String,
    pub slot: String,

    pub serial: String,
    pub vendor: String,
    pub part_number: String,
    pub cable_type: CableType,

    pub state: u32,
    pub physical_state: u32,
    /// Bits per second
    pub speed: u64,
    pub width: u32,
    pub module_state: u32,

    pub data_path_state: Vec<u32>,
    /// mA per lane
    pub bias_current: Vec<f64>,
    /// dBm per lane
    pub rx_power: Vec<f64>,
    /// dBm per lane
    pub tx_power: Vec<f64>,
    pub snr_media: Vec<f64>,
    pub snr_host: Vec<f64>,
    pub raw_errors: Vec<u64>,

    /// Celsius
    pub temperature: f64,
    /// Millivolts
    pub voltage: f64,
    /// Nanometers
    pub wavelength: f64,
    /// Meters
    pub transfer_distance: f64,
    /// Signaling speed → dB, copper only
    pub attenuation: BTreeMap<String, f64>,

    pub effective_ber: f64,
    pub effective_errors: u64,
    pub raw_ber: f64,
    pub symbol_ber: f64,
    pub symbol_errors: u64,
    pub link_down: u64,
    pub link_recovery: u64,
    /// Indexed by bin number, `-1` marks a bin that could not be parsed
    pub fec_histogram: Vec<i64>,
    /// Seconds since the counters were last cleared
    pub last_clear_time: f64,
}

impl PortMetrics {
    /// An all-zero record labelled for `identity`
    pub fn new(identity: &AdapterIdentity, host: &HostContext, slot: &str) -> Self {
        Self {
            bus_address: identity.bus_address,
            mode: identity.mode,
            controller_name: optional_label(identity.controller_name.as_deref()),
            network_device_name: optional_label(identity.network_device_name.as_deref()),
            partition_key: optional_label(identity.partition_key.as_deref()),
            hostname: host.hostname.clone(),
            system_serial: host.system_serial.clone(),
            slot: optional_label(Some(slot)),
            serial: UNKNOWN_LABEL.to_string(),
            vendor: UNKNOWN_LABEL.to_string(),
            part_number: UNKNOWN_LABEL.to_string(),
            cable_type: CableType::Unknown,
            state: 0,
            physical_state: 0,
            speed: 0,
            width: 0,
            module_state: 0,
            data_path_state: Vec::new(),
            bias_current: Vec::new(),
            rx_power: Vec::new(),
            tx_power: Vec::new(),
            snr_media: Vec::new(),
            snr_host: Vec::new(),
            raw_errors: Vec::new(),
            temperature: 0.0,
            voltage: 0.0,
            wavelength: 0.0,
            transfer_distance: 0.0,
            attenuation: BTreeMap::new(),
            effective_ber: 0.0,
            effective_errors: 0,
            raw_ber: 0.0,
            symbol_ber: 0.0,
            symbol_errors: 0,
            link_down: 0,
            link_recovery: 0,
            fec_histogram: Vec::new(),
            last_clear_time: 0.0,
        }
    }

    pub fn is_optical(&self) -> bool {
        self.cable_type == CableType::Optical
    }

    pub fn is_infiniband(&self) -> bool {
        self.mode == LinkMode::Infiniband
    }
}
