//! Slot inventory tests

mod common;

use common::{address, SLOT_REPORT};
use smc_exporter::host::slots::{
    find_slot_number, parse_slot_inventory, slot_label, slot_number_from_designation,
};
use smc_exporter::host::UNKNOWN_LABEL;

#[test]
fn test_report_yields_one_slot_per_block_in_order() {
    // Given: A four-block firmware report
    // When: Parsing it
    let slots = parse_slot_inventory(SLOT_REPORT);

    // Then: Every block is recovered in report order
    let designations: Vec<&str> = slots.iter().map(|s| s.designation.as_str()).collect();
    assert_eq!(
        designations,
        vec![
            "CPU1 SLOT1 PCI-E 4.0 X16",
            "CPU1 SLOT2 PCI-E 4.0 X8",
            "CPU2 SLOT7 PCI-E 4.0 X16",
            "PCIE6",
        ]
    );

    let numbers: Vec<Option<u32>> = slots.iter().map(|s| s.slot_number).collect();
    assert_eq!(numbers, vec![Some(1), Some(2), Some(7), Some(6)]);

    assert_eq!(slots[2].bus_address, Some(address("0000:b1:00.0")));
}

#[test]
fn test_slot_number_extraction() {
    assert_eq!(slot_number_from_designation("CPU2 SLOT7 PCI-E 4.0 X16"), Some(7));
    assert_eq!(slot_number_from_designation("Slot #12"), Some(12));
    assert_eq!(slot_number_from_designation("slot3"), Some(3));
    assert_eq!(slot_number_from_designation("PCIE6"), Some(6));
    assert_eq!(slot_number_from_designation("OCP NIC"), None);
}

#[test]
fn test_block_without_designation_is_dropped() {
    let report = "System Slot Information\n\tType: x16\n\tBus Address: 0000:17:00.0\n\
                  System Slot Information\n\tDesignation: SLOT3\n\tBus Address: 0000:31:00.0\n";

    let slots = parse_slot_inventory(report);

    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].slot_number, Some(3));
}

#[test]
fn test_second_function_shares_the_slot() {
    // Given: The slot table only knows function 0
    let slots = parse_slot_inventory(SLOT_REPORT);

    // When: Looking up both ports of a dual-port adapter
    // Then: They resolve to the same slot
    assert_eq!(find_slot_number(&slots, address("0000:17:00.0")), Some(1));
    assert_eq!(find_slot_number(&slots, address("0000:17:00.1")), Some(1));
}

#[test]
fn test_unmatched_address_uses_sentinel() {
    let slots = parse_slot_inventory(SLOT_REPORT);

    assert_eq!(slot_label(&slots, address("0000:e3:00.0")), UNKNOWN_LABEL);
    assert_eq!(slot_label(&slots, address("0000:b1:00.0")), "7");
}

#[test]
fn test_empty_report() {
    assert!(parse_slot_inventory("").is_empty());
    assert!(parse_slot_inventory("# dmidecode 3.3\nNo SMBIOS nor DMI entry point found").is_empty());
}
