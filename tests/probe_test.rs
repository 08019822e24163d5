//! Diagnostic tool adapter tests
//!
//! Tests for invoking the diagnostic tool and classifying its failures.

mod common;

use common::{
    ethernet_identity, ScriptedRunner, ETH_OPTICAL_200G, HISTOGRAM_UNSUPPORTED,
};
use serde_json::Value;
use smc_exporter::error::ExporterError;
use smc_exporter::host::{CommandOutput, HostContext};
use smc_exporter::mlxlink::{
    diagnostic_args, is_tolerated_failure, parse_document, probe_port, run_diagnostics,
};

const BUS: &str = "0000:17:00.0";

#[test]
fn test_diagnostic_arguments() {
    let args = diagnostic_args(&ethernet_identity(BUS));

    assert_eq!(
        args,
        vec![
            "-d",
            "0000:17:00.0",
            "-m",
            "-c",
            "--rx_fec_histogram",
            "--show_histogram",
            "--json"
        ]
    );
}

#[tokio::test]
async fn test_successful_probe_decodes_record() {
    // Given: A tool run that succeeds
    let runner =
        ScriptedRunner::new().respond_diagnostics(BUS, CommandOutput::success(ETH_OPTICAL_200G));

    // When: Probing the adapter
    let port = probe_port(
        &runner,
        "mlxlink",
        &ethernet_identity(BUS),
        &HostContext::default(),
        "1",
    )
    .await
    .expect("probe should succeed");

    // Then: The record carries decoded values and identity labels
    assert_eq!(port.state, 3);
    assert_eq!(port.bias_current.len(), 4);
    assert_eq!(port.slot, "1");
    assert_eq!(port.controller_name, "mlx5_0");
    assert_eq!(runner.calls().len(), 1, "Exactly one invocation, no retry");
}

#[tokio::test]
async fn test_unsupported_histogram_is_tolerated() {
    // Given: A non-zero exit whose status says the histogram is unsupported
    let runner = ScriptedRunner::new().respond_diagnostics(
        BUS,
        CommandOutput::failure(1, HISTOGRAM_UNSUPPORTED, ""),
    );

    // When: Probing the adapter
    let port = probe_port(
        &runner,
        "mlxlink",
        &ethernet_identity(BUS),
        &HostContext::default(),
        "1",
    )
    .await
    .expect("histogram failure must not drop the adapter");

    // Then: Everything else is still decoded
    assert_eq!(port.state, 3);
    assert_eq!(port.physical_state, 10);
    assert_eq!(port.speed, 200_000_000_000);
    assert_eq!(port.rx_power.len(), 4);
    assert!(port.fec_histogram.is_empty());
}

#[tokio::test]
async fn test_inactive_port_without_json_yields_empty_record() {
    // Given: The tool refuses with plain text because the port is down
    let runner = ScriptedRunner::new().respond_diagnostics(
        BUS,
        CommandOutput::failure(1, "", "-E- Port is not active"),
    );

    // When: Running the diagnostics
    let doc = run_diagnostics(&runner, "mlxlink", &ethernet_identity(BUS))
        .await
        .expect("inactive port is tolerated");

    // Then: There is no document to decode, but no error either
    assert_eq!(doc, Value::Null);
}

#[tokio::test]
async fn test_hard_failure_drops_adapter() {
    // Given: A non-zero exit with a message outside the tolerated set
    let stdout = r#"{"result":{"status":{"code":1,"message":"-E- Failed to open device: 0000:17:00.0"}}}"#;
    let runner =
        ScriptedRunner::new().respond_diagnostics(BUS, CommandOutput::failure(1, stdout, ""));

    // When: Probing the adapter
    let result = probe_port(
        &runner,
        "mlxlink",
        &ethernet_identity(BUS),
        &HostContext::default(),
        "1",
    )
    .await;

    // Then: The failure carries the tool's own message
    match result {
        Err(ExporterError::ToolFailed {
            program,
            code,
            message,
        }) => {
            assert_eq!(program, "mlxlink");
            assert_eq!(code, Some(1));
            assert!(message.contains("Failed to open device"));
        }
        other => panic!("Expected ToolFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_tool_is_a_spawn_error() {
    let runner = ScriptedRunner::new();

    let result = run_diagnostics(&runner, "mlxlink", &ethernet_identity(BUS)).await;

    assert!(matches!(result, Err(ExporterError::Spawn { .. })));
}

#[test]
fn test_tolerated_failure_matching_is_case_insensitive() {
    assert!(is_tolerated_failure("-E- FEC Histogram is not supported"));
    assert!(is_tolerated_failure("Link is DOWN"));
    assert!(is_tolerated_failure(
        "Feature is valid with active link operation only"
    ));
    assert!(!is_tolerated_failure("-E- Failed to open device"));
    assert!(!is_tolerated_failure(""));
}

#[test]
fn test_document_after_banner_is_parsed() {
    // Given: Output with a warning line before the JSON body
    let stdout = "-W- Using an unverified firmware\n{\"result\":{\"output\":{}}}\n";

    // When: Parsing
    let doc = parse_document(stdout).expect("banner should be skipped");

    // Then: The JSON body is returned
    assert!(doc.get("result").is_some());
}

#[test]
fn test_garbage_output_is_a_json_error() {
    let result = parse_document("mlxlink: command output truncated");

    assert!(matches!(result, Err(ExporterError::Json(_))));
}
