//! Metric Projection
//!
//! Turns the current [`CollectionSnapshot`] into Prometheus metric families on
//! every scrape. Nothing is stored between scrapes: each call builds fresh
//! gauge vectors, fills them from the snapshot and hands them to the registry.
//!
//! # Metric Families
//!
//! All names are `<namespace>_<subsystem>_<field>`, e.g.
//! `smc_nic_module_rx_power_dbm`. Every observation carries [`PORT_LABELS`];
//! per-lane, per-speed and per-bin families prepend `lane`, `speed` or `bin`.
//!
//! Families that do not apply to a port are omitted for that port:
//! - optical only: bias current, rx/tx power, SNR, data-path state, wavelength
//! - copper only: attenuation
//! - infiniband only: symbol BER/errors, link down, link error recovery

use crate::cache::{CollectionSnapshot, SnapshotCache};
use crate::mlxlink::PortMetrics;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};
use tracing::error;

/// Labels attached to every port observation
pub const PORT_LABELS: &[&str] = &[
    "bus",
    "mode",
    "caname",
    "netdev",
    "pkey",
    "serial",
    "hostname",
    "systemserial",
    "slot",
];

struct Family {
    name: &'static str,
    help: &'static str,
    leading_labels: &'static [&'static str],
}

const fn port(name: &'static str, help: &'static str) -> Family {
    Family {
        name,
        help,
        leading_labels: &[],
    }
}

const fn per(
    leading_labels: &'static [&'static str],
    name: &'static str,
    help: &'static str,
) -> Family {
    Family {
        name,
        help,
        leading_labels,
    }
}

/// Gauge vectors for one projection pass
struct PortFamilies {
    state: GaugeVec,
    physical_state: GaugeVec,
    speed: GaugeVec,
    width: GaugeVec,
    module_state: GaugeVec,
    module_info: GaugeVec,
    temperature: GaugeVec,
    voltage: GaugeVec,
    wavelength: GaugeVec,
    transfer_distance: GaugeVec,
    data_path_state: GaugeVec,
    bias_current: GaugeVec,
    rx_power: GaugeVec,
    tx_power: GaugeVec,
    snr_media: GaugeVec,
    snr_host: GaugeVec,
    raw_errors: GaugeVec,
    attenuation: GaugeVec,
    effective_ber: GaugeVec,
    effective_errors: GaugeVec,
    raw_ber: GaugeVec,
    symbol_ber: GaugeVec,
    symbol_errors: GaugeVec,
    link_down: GaugeVec,
    link_recovery: GaugeVec,
    fec_histogram: GaugeVec,
    last_clear_time: GaugeVec,
}

impl PortFamilies {
    fn new(namespace: &str, subsystem: &str) -> prometheus::Result<Self> {
        let build = |family: Family| -> prometheus::Result<GaugeVec> {
            let mut labels = family.leading_labels.to_vec();
            labels.extend_from_slice(PORT_LABELS);
            GaugeVec::new(
                Opts::new(family.name, family.help)
                    .namespace(namespace)
                    .subsystem(subsystem),
                &labels,
            )
        };

        Ok(Self {
            state: build(port("state", "Port state machine code (3=Active)"))?,
            physical_state: build(port(
                "physical_state",
                "Physical state code (7=LinkUp, 10=ETH_AN_FSM_ENABLE)",
            ))?,
            speed: build(port("speed_bits_per_second", "Link speed in bits per second"))?,
            width: build(port("width_lanes", "Active lane count"))?,
            module_state: build(port("module_state", "Module state code (3=ModuleReady)"))?,
            module_info: build(per(
                &["vendor", "part_number"],
                "module_info",
                "Module vendor and part number (value is always 1)",
            ))?,
            temperature: build(port("temperature_celsius", "Module temperature in Celsius"))?,
            voltage: build(port("voltage_millivolts", "Module supply voltage in mV"))?,
            wavelength: build(port("wavelength_nm", "Laser wavelength in nm for optical cables"))?,
            transfer_distance: build(port("transfer_distance_meters", "Transfer distance in m"))?,
            data_path_state: build(per(
                &["lane"],
                "data_path_state",
                "Data path state code per lane (4=DPActivated) for optical cables",
            ))?,
            bias_current: build(per(
                &["lane"],
                "bias_current_ma",
                "Bias current in mA per lane for optical cables",
            ))?,
            rx_power: build(per(
                &["lane"],
                "rx_power_dbm",
                "RX power in dBm per lane for optical cables",
            ))?,
            tx_power: build(per(
                &["lane"],
                "tx_power_dbm",
                "TX power in dBm per lane for optical cables",
            ))?,
            snr_media: build(per(
                &["lane"],
                "snr_media_db",
                "Media side SNR in dB per lane for optical cables",
            ))?,
            snr_host: build(per(
                &["lane"],
                "snr_host_db",
                "Host side SNR in dB per lane for optical cables",
            ))?,
            raw_errors: build(per(&["lane"], "raw_errors", "Raw physical errors per lane"))?,
            attenuation: build(per(
                &["speed"],
                "attenuation_db",
                "Attenuation in dB per signal speed for copper cables",
            ))?,
            effective_ber: build(port("effective_ber", "Effective physical bit error rate"))?,
            effective_errors: build(port("effective_errors", "Effective physical errors"))?,
            raw_ber: build(port("raw_ber", "Raw physical bit error rate"))?,
            symbol_ber: build(port("symbol_ber", "Symbol bit error rate (infiniband)"))?,
            symbol_errors: build(port("symbol_errors", "Symbol errors (infiniband)"))?,
            link_down: build(port("link_down", "Link down events (infiniband)"))?,
            link_recovery: build(port(
                "link_recovery",
                "Link error recovery events (infiniband)",
            ))?,
            fec_histogram: build(per(
                &["bin"],
                "fec_histogram",
                "Corrected FEC errors per histogram bin (-1 = unreadable bin)",
            ))?,
            last_clear_time: build(port(
                "last_clear_time_seconds",
                "Seconds since the physical counters were last cleared",
            ))?,
        })
    }

    fn all(&self) -> [&GaugeVec; 27] {
        [
            &self.state,
            &self.physical_state,
            &self.speed,
            &self.width,
            &self.module_state,
            &self.module_info,
            &self.temperature,
            &self.voltage,
            &self.wavelength,
            &self.transfer_distance,
            &self.data_path_state,
            &self.bias_current,
            &self.rx_power,
            &self.tx_power,
            &self.snr_media,
            &self.snr_host,
            &self.raw_errors,
            &self.attenuation,
            &self.effective_ber,
            &self.effective_errors,
            &self.raw_ber,
            &self.symbol_ber,
            &self.symbol_errors,
            &self.link_down,
            &self.link_recovery,
            &self.fec_histogram,
            &self.last_clear_time,
        ]
    }

    fn observe(&self, port: &PortMetrics) {
        let bus = port.bus_address.to_string();
        let labels: [&str; 9] = [
            &bus,
            port.mode.as_str(),
            &port.controller_name,
            &port.network_device_name,
            &port.partition_key,
            &port.serial,
            &port.hostname,
            &port.system_serial,
            &port.slot,
        ];

        let set = |vec: &GaugeVec, value: f64| vec.with_label_values(&labels).set(value);
        let set_indexed = |vec: &GaugeVec, index: &str, value: f64| {
            let mut values = Vec::with_capacity(labels.len() + 1);
            values.push(index);
            values.extend_from_slice(&labels);
            vec.with_label_values(&values).set(value);
        };
        let set_lanes = |vec: &GaugeVec, lanes: &[f64]| {
            for (i, value) in lanes.iter().enumerate() {
                set_indexed(vec, &(i + 1).to_string(), *value);
            }
        };

        set(&self.state, f64::from(port.state));
        set(&self.physical_state, f64::from(port.physical_state));
        set(&self.speed, port.speed as f64);
        set(&self.width, f64::from(port.width));
        set(&self.module_state, f64::from(port.module_state));
        set(&self.temperature, port.temperature);
        set(&self.voltage, port.voltage);
        set(&self.transfer_distance, port.transfer_distance);

        let mut info_values = vec![port.vendor.as_str(), port.part_number.as_str()];
        info_values.extend_from_slice(&labels);
        self.module_info.with_label_values(&info_values).set(1.0);

        if port.is_optical() {
            set(&self.wavelength, port.wavelength);
            set_lanes(&self.bias_current, &port.bias_current);
            set_lanes(&self.rx_power, &port.rx_power);
            set_lanes(&self.tx_power, &port.tx_power);
            set_lanes(&self.snr_media, &port.snr_media);
            set_lanes(&self.snr_host, &port.snr_host);
            let states: Vec<f64> = port.data_path_state.iter().map(|s| f64::from(*s)).collect();
            set_lanes(&self.data_path_state, &states);
        }

        for (speed, value) in &port.attenuation {
            set_indexed(&self.attenuation, speed, *value);
        }

        let raw_errors: Vec<f64> = port.raw_errors.iter().map(|e| *e as f64).collect();
        set_lanes(&self.raw_errors, &raw_errors);

        set(&self.effective_ber, port.effective_ber);
        set(&self.effective_errors, port.effective_errors as f64);
        set(&self.raw_ber, port.raw_ber);
        set(&self.last_clear_time, port.last_clear_time);

        if port.is_infiniband() {
            set(&self.symbol_ber, port.symbol_ber);
            set(&self.symbol_errors, port.symbol_errors as f64);
            set(&self.link_down, port.link_down as f64);
            set(&self.link_recovery, port.link_recovery as f64);
        }

        for (bin, count) in port.fec_histogram.iter().enumerate() {
            set_indexed(&self.fec_histogram, &bin.to_string(), *count as f64);
        }
    }
}

/// Project a snapshot into metric families
///
/// Families without observations are returned empty; the registry drops them
/// when gathering.
pub fn project(
    snapshot: &CollectionSnapshot,
    namespace: &str,
    subsystem: &str,
) -> prometheus::Result<Vec<MetricFamily>> {
    let families = PortFamilies::new(namespace, subsystem)?;
    for port in &snapshot.ports {
        families.observe(port);
    }

    Ok(families
        .all()
        .iter()
        .flat_map(|vec| vec.collect())
        .collect())
}

/// Registry collector that serves the cache's current snapshot
pub struct NicModuleProjection {
    namespace: String,
    subsystem: String,
    cache: SnapshotCache,
    descriptors: PortFamilies,
}

impl NicModuleProjection {
    pub fn new(namespace: &str, subsystem: &str, cache: SnapshotCache) -> prometheus::Result<Self> {
        Ok(Self {
            namespace: namespace.to_string(),
            subsystem: subsystem.to_string(),
            cache,
            descriptors: PortFamilies::new(namespace, subsystem)?,
        })
    }
}

impl Collector for NicModuleProjection {
    fn desc(&self) -> Vec<&Desc> {
        self.descriptors
            .all()
            .into_iter()
            .flat_map(|vec| vec.desc())
            .collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let snapshot = self.cache.load();
        match project(&snapshot, &self.namespace, &self.subsystem) {
            Ok(families) => families,
            Err(e) => {
                error!("Failed to project snapshot {}: {}", snapshot.generation, e);
                Vec::new()
            }
        }
    }
}
