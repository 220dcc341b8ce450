//! Configuration management

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sysfs: SysfsConfig,
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("joulemeter").join("config.toml"))
    }

    /// Load configuration from disk, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }
}

/// Where the kernel exposes energy sensors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SysfsConfig {
    /// Root of the powercap class (RAPL zones live below it)
    #[serde(default = "default_powercap_root")]
    pub powercap_root: PathBuf,
    /// Root of the hwmon class
    #[serde(default = "default_hwmon_root")]
    pub hwmon_root: PathBuf,
}

fn default_powercap_root() -> PathBuf { PathBuf::from("/sys/class/powercap") }
fn default_hwmon_root() -> PathBuf { PathBuf::from("/sys/class/hwmon") }

impl Default for SysfsConfig {
    fn default() -> Self {
        Self {
            powercap_root: default_powercap_root(),
            hwmon_root: default_hwmon_root(),
        }
    }
}
