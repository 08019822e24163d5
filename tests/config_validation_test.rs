//! Configuration validation tests
//!
//! Tests that verify configuration defaults, layering and validation.

use smc_exporter::config::{Config, MetricsConfig, ServerConfig, ToolsConfig, TopologyConfig};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn write_config(contents: &str) -> (TempDir, String) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("exporter.toml");
    fs::write(&path, contents).expect("write config");
    let path = path.to_string_lossy().into_owned();
    (dir, path)
}

#[test]
fn test_default_server_config() {
    let config = ServerConfig::default();

    assert_eq!(config.addr, "0.0.0.0");
    assert_eq!(config.port, 2112);
}

#[test]
fn test_default_metrics_config() {
    let config = MetricsConfig::default();

    assert_eq!(config.scrape_interval_seconds, 10);
    assert_eq!(config.namespace, "smc");
    assert_eq!(config.subsystem, "nic_module");
}

#[test]
fn test_default_tools_config() {
    let config = ToolsConfig::default();

    assert_eq!(config.mlxlink, "mlxlink");
    assert_eq!(config.lspci, "lspci");
    assert_eq!(config.dmidecode, "dmidecode");
    assert_eq!(config.ibdev2netdev, "ibdev2netdev");
    assert_eq!(config.vendor, "Mellanox");
    assert_eq!(config.command_timeout(), Duration::from_secs(30));
}

#[test]
fn test_default_topology_config() {
    let config = TopologyConfig::default();

    assert_eq!(config.sysfs_root, PathBuf::from("/sys"));
    assert_eq!(config.procfs_root, PathBuf::from("/proc"));
}

#[test]
fn test_defaults_are_valid() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_zero_interval_is_rejected() {
    let mut config = Config::default();
    config.metrics.scrape_interval_seconds = 0;

    let error = config.validate().unwrap_err();

    assert!(error.to_string().contains("scrape_interval_seconds"));
}

#[test]
fn test_zero_timeout_is_rejected() {
    let mut config = Config::default();
    config.tools.command_timeout_seconds = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_empty_namespace_is_rejected() {
    let mut config = Config::default();
    config.metrics.namespace = String::new();

    assert!(config.validate().is_err());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    // Given: A file that only overrides a few keys
    let (_dir, path) = write_config(
        r#"
[server]
port = 9200

[tools]
mlxlink = "/opt/mft/bin/mlxlink"
"#,
    );

    // When: Loading it
    let config = Config::load(&path).expect("partial config should load");

    // Then: Overridden keys change and everything else keeps its default
    assert_eq!(config.server.port, 9200);
    assert_eq!(config.server.addr, "0.0.0.0");
    assert_eq!(config.tools.mlxlink, "/opt/mft/bin/mlxlink");
    assert_eq!(config.tools.lspci, "lspci");
    assert_eq!(config.metrics.namespace, "smc");
}

#[test]
fn test_invalid_file_values_fail_to_load() {
    let (_dir, path) = write_config("[metrics]\nscrape_interval_seconds = 0\n");

    assert!(Config::load(&path).is_err());
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let config = Config::load("/nonexistent/smc-exporter.toml").expect("file is optional");

    assert_eq!(config.server.port, 2112);
}
