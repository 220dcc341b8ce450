//! Core module - configuration, errors and common types

mod config;
mod error;
mod types;

pub use config::{Config, SysfsConfig};
pub use error::{Error, Result};
pub use types::{CounterType, Joules, JoulesCpu};
