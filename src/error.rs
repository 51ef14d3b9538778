//! Error types for tcpsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Only request-level
//! problems are errors; per-port failures are folded into scan results.

use std::path::PathBuf;
use thiserror::Error;

/// Request-level failures of a scan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("invalid port range {start}-{end}: ports must satisfy 1 <= start <= end <= 65535")]
    InvalidRange { start: u32, end: u32 },

    #[error("invalid concurrency {0}: must be at least 1")]
    InvalidConcurrency(usize),

    #[error("invalid timeout: must be greater than zero")]
    InvalidTimeout,

    #[error("failed to resolve '{target}': {reason}")]
    ResolutionFailed { target: String, reason: String },

    #[error("scan cancelled after {scanned} of {total} ports")]
    Cancelled { scanned: usize, total: usize },
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
