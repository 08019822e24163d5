//! Error message quality tests
//!
//! Tests that verify error messages are helpful and distinguishable.

use smc_exporter::error::ExporterError;
use smc_exporter::host::{CommandOutput, PciAddress};
use std::error::Error;
use std::io;

#[test]
fn test_tool_failure_message_clarity() {
    // Given: A diagnostic tool that exited non-zero
    let error = ExporterError::ToolFailed {
        program: "mlxlink".to_string(),
        code: Some(1),
        message: "-E- Failed to open device".to_string(),
    };

    // When: Converting to string
    let message = format!("{}", error);

    // Then: Message names the tool, the status and the tool's own text
    assert!(message.contains("mlxlink"));
    assert!(message.contains("Some(1)"));
    assert!(message.contains("Failed to open device"));
}

#[test]
fn test_timeout_message_clarity() {
    let error = ExporterError::Timeout {
        program: "mlxlink".to_string(),
        seconds: 30,
    };

    let message = format!("{}", error);

    assert!(message.contains("mlxlink"));
    assert!(message.contains("30s"));
}

#[test]
fn test_spawn_error_keeps_source() {
    // Given: A tool that is not installed
    let error = ExporterError::Spawn {
        program: "ibdev2netdev".to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
    };

    // Then: The message names the tool and the io error is the source
    assert!(error.to_string().contains("ibdev2netdev"));
    assert!(error.source().is_some());
}

#[test]
fn test_invalid_address_message_clarity() {
    let error = "17:00".parse::<PciAddress>().unwrap_err();

    let message = error.to_string();

    assert!(message.contains("Invalid bus address"));
    assert!(message.contains("17:00"));
}

#[test]
fn test_failed_output_becomes_tool_failed() {
    // Given: A failed run with output on stderr
    let output = CommandOutput::failure(2, "", "dmidecode: Permission denied\n");

    // When: Asking for its stdout
    let error = output.into_stdout("dmidecode").unwrap_err();

    // Then: The error carries the exit code and trimmed message
    match error {
        ExporterError::ToolFailed {
            program,
            code,
            message,
        } => {
            assert_eq!(program, "dmidecode");
            assert_eq!(code, Some(2));
            assert_eq!(message, "dmidecode: Permission denied");
        }
        other => panic!("Expected ToolFailed, got {:?}", other),
    }
}

#[test]
fn test_errors_are_distinguishable() {
    let errors = [
        ExporterError::Config("bad".to_string()),
        ExporterError::InvalidAddress("bad".to_string()),
        ExporterError::Timeout {
            program: "bad".to_string(),
            seconds: 1,
        },
    ];

    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert_ne!(messages[0], messages[1]);
    assert_ne!(messages[1], messages[2]);
    assert!(messages[0].contains("Configuration error"));
}
