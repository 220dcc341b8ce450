//! Local machine context
//!
//! The root handle from which energy accounting is reached. It is built once
//! and passed explicitly to whatever needs it.

use crate::core::{Config, Result};
use crate::energy::Energy;

pub struct Machine {
    config: Config,
    energy: Energy,
}

impl Machine {
    /// Handle for the local machine, using the on-disk configuration if present
    pub fn local() -> Result<Self> {
        Self::with_config(Config::load()?)
    }

    /// Handle for the local machine with explicit sysfs locations
    pub fn with_config(config: Config) -> Result<Self> {
        log::debug!("Initializing machine with {:?}", config.sysfs);
        let energy = Energy::detect(&config.sysfs)?;
        Ok(Self { config, energy })
    }

    /// Energy accounting facade
    pub fn energy(&self) -> &Energy {
        &self.energy
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
