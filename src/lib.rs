//! # tcpsweep - A bounded-concurrency TCP connect scanner
//!
//! tcpsweep checks which ports of a single host accept TCP connections. It
//! runs one connection attempt per port, never more than a configured number
//! at once, and reports each outcome as soon as it is known.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use tcpsweep::scanner::{ScanEngine, ScanRequest};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let request = ScanRequest::new("192.168.1.1".parse().unwrap(), 1, 1024)
//!         .with_concurrency(200)
//!         .with_timeout(Duration::from_millis(500));
//!
//!     let result = ScanEngine::tcp().scan(&request).await.unwrap();
//!     println!("open: {:?}", result.open_ports);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`scanner`] - the scan engine, the `Probe` trait and the TCP connect probe
//! - [`types`] - ports, port ranges, targets and the domain resolution adapter
//! - [`services`] - well-known port to service label table
//! - [`report`] - serializable scan reports
//! - [`output`] - live progress reporting and result formatting
//! - [`config`] - settings file
//! - [`cli`] - command-line front end
//! - [`error`] - error types

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod report;
pub mod scanner;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ScanError};
pub use scanner::{
    scan, PortOutcome, PortState, Probe, ScanEngine, ScanRequest, ScanResult, ScanStatus,
};
pub use types::{Port, PortRange, ScanTarget, TargetSpec};
