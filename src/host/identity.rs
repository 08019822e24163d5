//! Host identity labels shared by every port of a cycle

use super::runner::CommandRunner;
use super::types::{label_or_unknown, UNKNOWN_LABEL};
use tracing::warn;

/// Hostname and chassis serial, resolved once per collection cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    pub hostname: String,
    pub system_serial: String,
}

impl Default for HostContext {
    fn default() -> Self {
        Self {
            hostname: UNKNOWN_LABEL.to_string(),
            system_serial: UNKNOWN_LABEL.to_string(),
        }
    }
}

impl HostContext {
    pub async fn discover<R: CommandRunner>(runner: &R, dmidecode: &str) -> Self {
        let hostname = match hostname::get() {
            Ok(name) => label_or_unknown(&name.to_string_lossy()),
            Err(e) => {
                warn!("Error getting hostname: {}", e);
                UNKNOWN_LABEL.to_string()
            }
        };

        let args = ["-s".to_string(), "system-serial-number".to_string()];
        let system_serial = match runner
            .run(dmidecode, &args)
            .await
            .and_then(|out| out.into_stdout(dmidecode))
        {
            Ok(stdout) => label_or_unknown(&stdout),
            Err(e) => {
                warn!("Error reading system serial number: {}", e);
                UNKNOWN_LABEL.to_string()
            }
        };

        Self {
            hostname,
            system_serial,
        }
    }
}
