//! `mlxlink` Diagnostic Tool Adapter
//!
//! Runs the per-port diagnostic tool against one adapter and decodes its
//! structured output into a [`PortMetrics`] record.
//!
//! # Invocation
//!
//! ```text
//! mlxlink -d 0000:17:00.0 -m -c --rx_fec_histogram --show_histogram --json
//! ```
//!
//! # Failure Classification
//!
//! A non-zero exit is tolerated only when the status message says the port
//! is inactive or the FEC histogram is unsupported; decoding then proceeds on
//! whatever JSON was printed. Any other non-zero exit drops the adapter for
//! the current cycle.

pub mod decode;
pub mod tables;
pub mod types;

pub use decode::decode_port;
pub use types::{CableType, PortMetrics};

use crate::error::{ExporterError, Result};
use crate::host::{AdapterIdentity, CommandRunner, HostContext};
use serde_json::Value;
use tracing::debug;

/// Status messages that still leave usable output behind (lowercase)
pub const TOLERATED_FAILURES: &[&str] = &[
    "not supported for this device",
    "fec histogram is not supported",
    "valid with active link operation only",
    "port is not active",
    "link is down",
];

/// Arguments for one structured diagnostic run against `identity`
pub fn diagnostic_args(identity: &AdapterIdentity) -> Vec<String> {
    let mut args = vec!["-d".to_string(), identity.bus_address.to_string()];
    args.extend(
        ["-m", "-c", "--rx_fec_histogram", "--show_histogram", "--json"]
            .iter()
            .map(|arg| arg.to_string()),
    );
    args
}

/// Whether a failure message names an acceptable condition
pub fn is_tolerated_failure(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    TOLERATED_FAILURES
        .iter()
        .any(|allowed| message.contains(allowed))
}

/// `result.status.message` of a diagnostic document
pub fn status_message(doc: &Value) -> Option<&str> {
    doc.get("result")?.get("status")?.get("message")?.as_str()
}

/// Parse the JSON document, skipping any banner printed before it
pub fn parse_document(stdout: &str) -> Result<Value> {
    match serde_json::from_str(stdout.trim()) {
        Ok(doc) => Ok(doc),
        Err(e) => match (stdout.find('{'), stdout.rfind('}')) {
            (Some(start), Some(end)) if start < end => {
                Ok(serde_json::from_str(&stdout[start..=end])?)
            }
            _ => Err(ExporterError::Json(e)),
        },
    }
}

/// Run the diagnostic tool for one adapter and return its JSON document
pub async fn run_diagnostics<R: CommandRunner>(
    runner: &R,
    program: &str,
    identity: &AdapterIdentity,
) -> Result<Value> {
    let output = runner.run(program, &diagnostic_args(identity)).await?;
    let document = parse_document(&output.stdout);

    if output.is_success() {
        return document;
    }

    let combined = output.combined();
    let message = document
        .as_ref()
        .ok()
        .and_then(status_message)
        .map(str::to_string)
        .unwrap_or_else(|| combined.trim().to_string());

    if is_tolerated_failure(&message) || is_tolerated_failure(&combined) {
        debug!(
            "Tolerating {} exit {:?} for {}: {}",
            program, output.code, identity.bus_address, message
        );
        return Ok(document.unwrap_or(Value::Null));
    }

    Err(ExporterError::ToolFailed {
        program: program.to_string(),
        code: output.code,
        message,
    })
}

/// Diagnose one adapter end to end
pub async fn probe_port<R: CommandRunner>(
    runner: &R,
    program: &str,
    identity: &AdapterIdentity,
    host: &HostContext,
    slot: &str,
) -> Result<PortMetrics> {
    let document = run_diagnostics(runner, program, identity).await?;
    Ok(decode_port(&document, identity, host, slot))
}
