//! Energy accounting module
//!
//! Provides access to the cumulative energy counters of the local machine:
//! - CPUs: RAPL package zones (most precise)
//! - Plug: hwmon whole-machine energy meter

mod linux;

pub use linux::{CpusCounter, PlugCounter};

use crate::core::{CounterType, Joules, Result, SysfsConfig};

/// A cumulative energy counter
pub trait Counter: Send + Sync {
    /// Joules consumed since the counter was created (or since the last `reset`)
    ///
    /// Hardware counters wrap, and each read corrects for at most one wrap.
    /// Reading less often than the wrap period (minutes on a busy RAPL
    /// package) under-counts without any error.
    fn joules(&self) -> Result<Joules>;

    /// Restart accounting from zero
    fn reset(&self) -> Result<()>;

    /// Where this counter measures
    fn counter_type(&self) -> CounterType;
}

/// Energy facade exposing whichever counters this machine has
pub struct Energy {
    cpus: Option<CpusCounter>,
    plug: Option<PlugCounter>,
}

impl Energy {
    /// Detect the available counters below the configured sysfs roots
    pub fn detect(sysfs: &SysfsConfig) -> Result<Self> {
        let cpus = CpusCounter::detect(&sysfs.powercap_root)?;
        let plug = PlugCounter::detect(&sysfs.hwmon_root)?;

        if cpus.is_none() && plug.is_none() {
            log::warn!("No energy counters detected");
        }

        Ok(Self { cpus, plug })
    }

    /// The most precise counter available, or `None` if there is none
    pub fn counter(&self) -> Option<&dyn Counter> {
        self.counter_types()
            .first()
            .and_then(|&counter_type| self.counter_of(counter_type))
    }

    /// Available counter types, most precise first
    pub fn counter_types(&self) -> Vec<CounterType> {
        let mut types = Vec::new();
        if self.cpus.is_some() {
            types.push(CounterType::Cpus);
        }
        if self.plug.is_some() {
            types.push(CounterType::Plug);
        }
        types
    }

    /// The counter of a specific type, if present
    pub fn counter_of(&self, counter_type: CounterType) -> Option<&dyn Counter> {
        match counter_type {
            CounterType::Cpus => self.cpus.as_ref().map(|c| c as &dyn Counter),
            CounterType::Plug => self.plug.as_ref().map(|c| c as &dyn Counter),
        }
    }

    /// The CPUs counter with its per-package component breakdown
    pub fn cpus_counter(&self) -> Option<&CpusCounter> {
        self.cpus.as_ref()
    }
}
