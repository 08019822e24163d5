//! Firmware slot inventory
//!
//! Parses `dmidecode -t slot` and maps adapter bus addresses to chassis slot
//! numbers.

use super::types::{PciAddress, PhysicalSlot, UNKNOWN_LABEL};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

const BLOCK_MARKER: &str = "System Slot Information";

static DESIGNATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Designation:\s+(.+)").expect("valid designation regex"));
static BUS_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bus Address:\s+(\S+)").expect("valid bus address regex"));
static SLOT_KEYWORD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)slot\s*#?\s*(\d+)").expect("valid slot number regex"));
static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid number regex"));

/// Split a slot inventory report into one [`PhysicalSlot`] per block, in
/// report order. Blocks without a designation are dropped.
pub fn parse_slot_inventory(report: &str) -> Vec<PhysicalSlot> {
    let mut slots = Vec::new();
    let mut current: Option<PhysicalSlot> = None;

    for line in report.lines() {
        if line.contains(BLOCK_MARKER) {
            slots.extend(current.take().filter(|s| !s.designation.is_empty()));
            current = Some(PhysicalSlot {
                designation: String::new(),
                bus_address: None,
                slot_number: None,
            });
            continue;
        }

        let Some(slot) = current.as_mut() else {
            continue;
        };

        if let Some(caps) = DESIGNATION.captures(line) {
            slot.designation = caps[1].trim().to_string();
            slot.slot_number = slot_number_from_designation(&slot.designation);
        } else if let Some(caps) = BUS_ADDRESS.captures(line) {
            slot.bus_address = caps[1].parse().ok();
        }
    }

    slots.extend(current.filter(|s| !s.designation.is_empty()));
    slots
}

/// Extract the slot number from a designation such as `CPU1 SLOT4 PCI-E 4.0 X16`.
///
/// Digits that follow the word "slot" win over any earlier digits.
pub fn slot_number_from_designation(designation: &str) -> Option<u32> {
    SLOT_KEYWORD_NUMBER
        .captures(designation)
        .and_then(|caps| caps.get(1))
        .or_else(|| FIRST_NUMBER.find(designation))
        .and_then(|m| m.as_str().parse().ok())
}

/// Slot number for an adapter, matched on its function-0 address
pub fn find_slot_number(slots: &[PhysicalSlot], address: PciAddress) -> Option<u32> {
    let root = address.root_function();
    let found = slots
        .iter()
        .find(|slot| slot.bus_address == Some(root))
        .and_then(|slot| slot.slot_number);

    if found.is_none() {
        debug!("No slot matches bus address {}", root);
    }
    found
}

/// Slot label for an adapter, [`UNKNOWN_LABEL`] when unmatched
pub fn slot_label(slots: &[PhysicalSlot], address: PciAddress) -> String {
    find_slot_number(slots, address).map_or_else(|| UNKNOWN_LABEL.to_string(), |n| n.to_string())
}
