use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::system::platform;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub ping: PingConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Probe names to leave out of the report.
    pub skip: Vec<String>,
    pub top_processes: usize,
    pub cpu_sample_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            skip: Vec::new(),
            top_processes: 5,
            cpu_sample_ms: 500,
        }
    }
}

/// The literal host name replaced by the discovered default gateway.
pub const DEFAULT_ROUTE_HOST: &str = "default_route";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PingConfig {
    pub hosts: Vec<String>,
    /// When the default gateway is this address, `additional_home_hosts`
    /// are pinged as well.
    pub home_router: String,
    pub additional_home_hosts: Vec<String>,
    pub timeout_secs: u32,
}

impl Default for PingConfig {
    fn default() -> Self {
        PingConfig {
            hosts: vec![
                DEFAULT_ROUTE_HOST.to_string(),
                "8.8.8.8".to_string(),
                "1.1.1.1".to_string(),
            ],
            home_router: "192.168.1.1".to_string(),
            additional_home_hosts: vec!["192.168.1.3".to_string()],
            timeout_secs: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub wireless: Option<String>,
    pub hypervisor: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            wireless: platform::default_wireless_path(),
            hypervisor: platform::default_hypervisor_path(),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sysprobe").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "invalid config, using defaults");
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}
