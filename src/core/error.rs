//! Error types for the library

use std::path::PathBuf;
use thiserror::Error;

/// Library-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {value:?} read from {}", path.display())]
    Parse { path: PathBuf, value: String },

    #[error("Unknown CPU package: {0}")]
    UnknownPackage(u32),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;
