//! Common types used across the library

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

/// Energy in joules
pub type Joules = f64;

/// Where an energy counter takes its measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterType {
    /// Measured at CPU package level (RAPL)
    Cpus,
    /// Measured for the whole machine (hwmon energy meter)
    Plug,
}

impl CounterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterType::Cpus => "cpus",
            CounterType::Plug => "plug",
        }
    }
}

impl fmt::Display for CounterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values that can be read from a CPU package energy counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JoulesCpu {
    /// Whole package
    pub cpu: Joules,
    /// Cores only (PP0)
    pub cores: Joules,
    /// Integrated graphics (PP1 / uncore)
    pub graphic: Joules,
    /// Memory controller and DIMMs
    pub dram: Joules,
}

impl JoulesCpu {
    pub fn new(cpu: Joules, cores: Joules, graphic: Joules, dram: Joules) -> Self {
        Self { cpu, cores, graphic, dram }
    }

    pub fn zero(&mut self) {
        *self = Self::default();
    }
}

impl AddAssign for JoulesCpu {
    fn add_assign(&mut self, rhs: Self) {
        self.cpu += rhs.cpu;
        self.cores += rhs.cores;
        self.graphic += rhs.graphic;
        self.dram += rhs.dram;
    }
}

impl SubAssign for JoulesCpu {
    fn sub_assign(&mut self, rhs: Self) {
        self.cpu -= rhs.cpu;
        self.cores -= rhs.cores;
        self.graphic -= rhs.graphic;
        self.dram -= rhs.dram;
    }
}

impl Add for JoulesCpu {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sub for JoulesCpu {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl Mul<f64> for JoulesCpu {
    type Output = Self;

    fn mul(self, x: f64) -> Self {
        Self::new(self.cpu * x, self.cores * x, self.graphic * x, self.dram * x)
    }
}

/// Dividing by a duration in seconds gives average watts per component
impl Div<f64> for JoulesCpu {
    type Output = Self;

    fn div(self, x: f64) -> Self {
        Self::new(self.cpu / x, self.cores / x, self.graphic / x, self.dram / x)
    }
}

impl fmt::Display for JoulesCpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}\t", self.cpu, self.cores, self.graphic, self.dram)
    }
}
