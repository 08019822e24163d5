use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_scrape_interval")]
    pub scrape_interval_seconds: u64,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_subsystem")]
    pub subsystem: String,
}

/// Locations of the external tools the collector shells out to.
#[derive(Debug, Deserialize, Clone)]
pub struct ToolsConfig {
    #[serde(default = "default_mlxlink")]
    pub mlxlink: String,
    #[serde(default = "default_lspci")]
    pub lspci: String,
    #[serde(default = "default_dmidecode")]
    pub dmidecode: String,
    #[serde(default = "default_ibdev2netdev")]
    pub ibdev2netdev: String,
    /// Upper bound for a single tool invocation
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
    /// Vendor string an `lspci` line must contain to be monitored
    #[serde(default = "default_vendor")]
    pub vendor: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TopologyConfig {
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
    #[serde(default = "default_procfs_root")]
    pub procfs_root: PathBuf,
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    2112
}

fn default_scrape_interval() -> u64 {
    10
}

fn default_namespace() -> String {
    "smc".to_string()
}

fn default_subsystem() -> String {
    "nic_module".to_string()
}

fn default_mlxlink() -> String {
    "mlxlink".to_string()
}

fn default_lspci() -> String {
    "lspci".to_string()
}

fn default_dmidecode() -> String {
    "dmidecode".to_string()
}

fn default_ibdev2netdev() -> String {
    "ibdev2netdev".to_string()
}

fn default_command_timeout() -> u64 {
    30
}

fn default_vendor() -> String {
    "Mellanox".to_string()
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys")
}

fn default_procfs_root() -> PathBuf {
    PathBuf::from("/proc")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            scrape_interval_seconds: default_scrape_interval(),
            namespace: default_namespace(),
            subsystem: default_subsystem(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            mlxlink: default_mlxlink(),
            lspci: default_lspci(),
            dmidecode: default_dmidecode(),
            ibdev2netdev: default_ibdev2netdev(),
            command_timeout_seconds: default_command_timeout(),
            vendor: default_vendor(),
        }
    }
}

impl ToolsConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            sysfs_root: default_sysfs_root(),
            procfs_root: default_procfs_root(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("SMC_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall the collection loop
    pub fn validate(&self) -> Result<()> {
        if self.metrics.scrape_interval_seconds == 0 {
            anyhow::bail!("metrics.scrape_interval_seconds must be greater than zero");
        }
        if self.tools.command_timeout_seconds == 0 {
            anyhow::bail!("tools.command_timeout_seconds must be greater than zero");
        }
        if self.metrics.namespace.is_empty() {
            anyhow::bail!("metrics.namespace must not be empty");
        }
        Ok(())
    }
}
