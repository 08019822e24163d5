//! Name → code lookup tables for enumerated `mlxlink` fields.
//!
//! Unknown names decode to 0, which no table assigns to a live state.

/// Port state machine (`Operational Info` / `State`)
pub static STATE: &[(&str, u32)] = &[
    ("Disabled", 0),
    ("Open port", 1),
    ("Polling", 2),
    ("Active", 3),
    ("Close port", 4),
    ("Physical LinkUp", 5),
    ("Sleep", 6),
    ("Rx disable", 7),
    ("Signal detect", 8),
    ("Receiver detect", 9),
    ("Sync peer", 10),
    ("Negotiation", 11),
    ("Training", 12),
    ("SubFSM active", 13),
];

/// Infiniband physical port state and the Ethernet auto-negotiation FSM
/// (`Operational Info` / `Physical state`)
pub static PHYSICAL_STATE: &[(&str, u32)] = &[
    ("Sleep", 1),
    ("Polling", 2),
    ("Disabled", 3),
    ("PortConfigurationTraining", 4),
    ("LinkErrorRecovery", 5),
    ("PhyTest", 6),
    ("LinkUp", 7),
    ("ETH_AN_FSM_XMIT_DISABLE", 8),
    ("ETH_AN_FSM_ABILITY_DETECT", 9),
    ("ETH_AN_FSM_ENABLE", 10),
    ("ETH_AN_FSM_ACK_DETECT", 11),
    ("ETH_AN_FSM_COMPLETE_ACK", 12),
    ("ETH_AN_FSM_AN_GOOD_CHECK", 13),
    ("ETH_AN_FSM_AN_GOOD", 14),
    ("ETH_AN_FSM_NEXT_PAGE_WAIT", 15),
    ("ETH_AN_FSM_LINK_STAT_CHECK", 16),
    ("ETH_AN_FSM_EXTRA_TUNE", 17),
    ("ETH_AN_FSM_FIX_REVERSALS", 18),
    ("ETH_AN_FSM_IB_FAIL", 19),
    ("ETH_AN_FSM_POST_LOCK_TUNE", 20),
];

/// CMIS module and data-path state machines
pub static MODULE_STATE: &[(&str, u32)] = &[
    ("ModuleLowPwr", 1),
    ("ModulePwrUp", 2),
    ("ModuleReady", 3),
    ("ModulePwrDn", 4),
    ("ModuleFault", 5),
    ("DPDeactivated", 1),
    ("DPInit", 2),
    ("DPDeinit", 3),
    ("DPActivated", 4),
    ("DPTxTurnOn", 5),
    ("DPTxTurnOff", 6),
    ("DPInitialized", 7),
];

const GBPS: u64 = 1_000_000_000;

/// Link speed in bits per second
pub static SPEED: &[(&str, u64)] = &[
    ("1G", GBPS),
    ("10G", 10 * GBPS),
    ("25G", 25 * GBPS),
    ("40G", 40 * GBPS),
    ("50G", 50 * GBPS),
    ("56G", 56 * GBPS),
    ("100G", 100 * GBPS),
    ("200G", 200 * GBPS),
    ("400G", 400 * GBPS),
    ("800G", 800 * GBPS),
    ("IB-SDR", 10 * GBPS),
    ("IB-DDR", 20 * GBPS),
    ("IB-QDR", 40 * GBPS),
    ("IB-FDR10", 40 * GBPS),
    ("IB-FDR", 56 * GBPS),
    ("IB-EDR", 100 * GBPS),
    ("IB-HDR", 200 * GBPS),
    ("IB-NDR", 400 * GBPS),
    ("IB-XDR", 800 * GBPS),
];

/// Look up `name` in `table`, returning zero for unknown names
pub fn lookup<T: Copy + Default>(table: &[(&str, T)], name: &str) -> T {
    let name = name.trim();
    table
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, code)| *code)
        .unwrap_or_default()
}
