//! Decoding of `mlxlink --json` documents into [`PortMetrics`].
//!
//! Values are addressed by section and key, never by line position. A value
//! may carry a trailing threshold range (`46 [-5..75]`); only the text before
//! the `[` is decoded.

use super::tables::{self, MODULE_STATE, PHYSICAL_STATE, SPEED, STATE};
use super::types::{CableType, PortMetrics};
use crate::host::types::{label_or_unknown, AdapterIdentity};
use crate::host::HostContext;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::debug;

pub const OPERATIONAL_INFO: &str = "Operational Info";
pub const MODULE_INFO: &str = "Module Info";
pub const COUNTERS: &str = "Physical Counters and BER Info";
pub const FEC_HISTOGRAM: &str = "Histogram of FEC Errors";

const VOLTS_TO_MILLIVOLTS: f64 = 1000.0;
const SECONDS_PER_MINUTE: f64 = 60.0;
const MALFORMED_BIN: i64 = -1;
/// Bins at or above this index are ignored
pub const MAX_FEC_BINS: usize = 64;

/// One section of `result.output`, possibly absent
#[derive(Clone, Copy)]
struct Section<'a>(Option<&'a Map<String, Value>>);

impl<'a> Section<'a> {
    fn of(doc: &'a Value, name: &str) -> Self {
        Section(
            doc.get("result")
                .and_then(|r| r.get("output"))
                .and_then(|o| o.get(name))
                .and_then(Value::as_object),
        )
    }

    fn raw(&self, key: &str) -> Option<Cow<'a, str>> {
        self.0.and_then(|map| map.get(key)).and_then(value_text)
    }

    fn text(&self, key: &str) -> String {
        self.raw(key).map(|v| value_part(&v).to_string()).unwrap_or_default()
    }

    fn scalar(&self, key: &str) -> f64 {
        self.raw(key).map_or(0.0, |v| parse_scalar(&v))
    }

    fn count(&self, key: &str) -> u64 {
        self.raw(key).map_or(0, |v| parse_count(&v))
    }

    fn list(&self, key: &str) -> Vec<f64> {
        self.raw(key).map(|v| parse_list(&v)).unwrap_or_default()
    }

    /// First key starting with `prefix`, with its value
    fn find_prefixed(&self, prefix: &str) -> Option<(&'a str, Cow<'a, str>)> {
        self.0?
            .iter()
            .find(|(key, _)| key.starts_with(prefix))
            .and_then(|(key, value)| Some((key.as_str(), value_text(value)?)))
    }
}

fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Array(items) => {
            let joined: Vec<String> = items
                .iter()
                .filter_map(value_text)
                .map(Cow::into_owned)
                .collect();
            Some(Cow::Owned(joined.join(",")))
        }
        _ => None,
    }
}

/// The value without its trailing `[low..high]` threshold range
pub fn value_part(raw: &str) -> &str {
    raw.split('[').next().unwrap_or_default().trim()
}

fn is_not_available(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("n/a")
}

/// Parse a comma-separated per-lane list. Entries that do not parse become 0.
pub fn parse_list(raw: &str) -> Vec<f64> {
    let value = value_part(raw);
    if is_not_available(value) {
        return Vec::new();
    }
    value
        .split(',')
        .map(|entry| entry.trim().parse().unwrap_or(0.0))
        .collect()
}

/// Parse the first entry of a value as a float, 0 when unparsable
pub fn parse_scalar(raw: &str) -> f64 {
    value_part(raw)
        .split(',')
        .next()
        .and_then(|entry| entry.trim().parse().ok())
        .unwrap_or(0.0)
}

/// Parse a non-negative counter, accepting float notation such as `1.5E3`
pub fn parse_count(raw: &str) -> u64 {
    let value = value_part(raw);
    value.parse::<u64>().unwrap_or_else(|_| {
        let float = parse_scalar(value);
        if float.is_finite() && float > 0.0 {
            float as u64
        } else {
            0
        }
    })
}

/// Parse `4x` into 4
pub fn parse_width(raw: &str) -> u32 {
    value_part(raw)
        .trim_end_matches(|c| c == 'x' || c == 'X')
        .trim()
        .parse()
        .unwrap_or(0)
}

/// Module voltage in millivolts, from either a `[mV]` or a `[V]` field
fn voltage_millivolts(module: Section<'_>) -> f64 {
    if let Some(raw) = module.raw("Voltage [mV]") {
        parse_scalar(&raw)
    } else if let Some(raw) = module.raw("Voltage [V]") {
        parse_scalar(&raw) * VOLTS_TO_MILLIVOLTS
    } else {
        0.0
    }
}

/// Pair the speeds named in `Attenuation (5g,7g,12g) [dB]` with its values
pub fn parse_attenuation(label: &str, raw: &str) -> BTreeMap<String, f64> {
    let speeds = label
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(speeds, _)| speeds)
        .unwrap_or_default();

    speeds
        .split(',')
        .map(str::trim)
        .filter(|speed| !speed.is_empty())
        .zip(parse_list(raw))
        .map(|(speed, value)| (speed.to_string(), value))
        .collect()
}

/// Decode `Bin <n>` entries into a vector indexed by bin number.
///
/// Missing bins between present ones stay 0; a bin whose count cannot be
/// parsed is recorded as -1. Indices of [`MAX_FEC_BINS`] or more are skipped.
pub fn parse_fec_histogram(section: &Map<String, Value>) -> Vec<i64> {
    let bins: Vec<(usize, i64)> = section
        .iter()
        .filter_map(|(key, value)| {
            let index = key.strip_prefix("Bin")?.trim().parse::<usize>().ok()?;
            if index >= MAX_FEC_BINS {
                debug!("Skipping out of range FEC histogram entry {:?}", key);
                return None;
            }
            Some((index, bin_count(value)))
        })
        .collect();

    let Some(len) = bins.iter().map(|(index, _)| index + 1).max() else {
        return Vec::new();
    };

    let mut histogram = vec![0; len];
    for (index, count) in bins {
        histogram[index] = count;
    }
    histogram
}

fn bin_count(value: &Value) -> i64 {
    let raw = match value {
        Value::Object(map) => map
            .get("values")
            .and_then(Value::as_array)
            .and_then(|values| values.last())
            .and_then(value_text),
        other => value_text(other),
    };

    raw.and_then(|text| value_part(&text).parse::<i64>().ok())
        .filter(|count| *count >= 0)
        .unwrap_or(MALFORMED_BIN)
}

/// Decode a full diagnostic document for one adapter
pub fn decode_port(
    doc: &Value,
    identity: &AdapterIdentity,
    host: &HostContext,
    slot: &str,
) -> PortMetrics {
    let mut port = PortMetrics::new(identity, host, slot);

    let operational = Section::of(doc, OPERATIONAL_INFO);
    port.state = tables::lookup(STATE, &operational.text("State"));
    port.physical_state = tables::lookup(PHYSICAL_STATE, &operational.text("Physical state"));
    port.speed = tables::lookup(SPEED, &operational.text("Speed"));
    port.width = operational.raw("Width").map_or(0, |w| parse_width(&w));

    let module = Section::of(doc, MODULE_INFO);
    port.serial = label_or_unknown(&module.text("Vendor Serial Number"));
    port.vendor = label_or_unknown(&module.text("Vendor Name"));
    port.part_number = label_or_unknown(&module.text("Vendor Part Number"));
    port.cable_type = CableType::from_description(&module.text("Cable Type"));
    port.module_state = tables::lookup(MODULE_STATE, &module.text("Module State"));
    port.temperature = module.scalar("Temperature [C]");
    port.voltage = voltage_millivolts(module);
    port.transfer_distance = module.scalar("Transfer Distance [m]");

    match port.cable_type {
        CableType::Optical => {
            port.bias_current = module.list("Bias Current [mA]");
            port.rx_power = module.list("Rx Power Current [dBm]");
            port.tx_power = module.list("Tx Power Current [dBm]");
            port.snr_media = module.list("SNR Media Lanes [dB]");
            port.snr_host = module.list("SNR Host Lanes [dB]");
            port.wavelength = module.scalar("Wavelength [nm]");
            port.data_path_state = module
                .raw("DataPath state [per lane]")
                .map(|raw| {
                    let value = value_part(&raw);
                    if is_not_available(value) {
                        return Vec::new();
                    }
                    value
                        .split(',')
                        .map(|state| tables::lookup(MODULE_STATE, state))
                        .collect()
                })
                .unwrap_or_default();
        }
        CableType::Copper => {
            if let Some((label, raw)) = module.find_prefixed("Attenuation") {
                port.attenuation = parse_attenuation(label, &raw);
            }
        }
        CableType::Unknown => {}
    }

    let counters = Section::of(doc, COUNTERS);
    port.effective_ber = counters.scalar("Effective Physical BER");
    port.effective_errors = counters.count("Effective Physical Errors");
    port.raw_ber = counters.scalar("Raw Physical BER");
    port.raw_errors = counters
        .raw("Raw Physical Errors Per Lane")
        .map(|raw| {
            let value = value_part(&raw);
            if is_not_available(value) {
                return Vec::new();
            }
            value.split(',').map(parse_count).collect()
        })
        .unwrap_or_default();
    port.last_clear_time = counters.scalar("Time Since Last Clear [Min]") * SECONDS_PER_MINUTE;

    if port.is_infiniband() {
        port.symbol_ber = counters.scalar("Symbol BER");
        port.symbol_errors = counters.count("Symbol Errors");
        port.link_down = counters.count("Link Down Counter");
        port.link_recovery = counters.count("Link Error Recovery Counter");
    }

    if let Section(Some(histogram)) = Section::of(doc, FEC_HISTOGRAM) {
        port.fec_histogram = parse_fec_histogram(histogram);
    }

    port
}
