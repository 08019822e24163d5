pub mod identity;
pub mod runner;
pub mod slots;
pub mod topology;
pub mod types;

pub use identity::HostContext;
pub use runner::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use topology::{SysfsLayout, TopologySnapshot};
pub use types::{AdapterIdentity, LinkMode, PciAddress, PhysicalSlot, UNKNOWN_LABEL};
