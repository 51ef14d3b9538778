//! Scanner module - the concurrent scan engine and its probes.
//!
//! [`ScanEngine`] partitions a port range into one [`Probe`] task per port,
//! runs them under a semaphore-bounded budget on the tokio runtime, and folds
//! each [`PortOutcome`] into a [`ResultAggregate`] as it completes.

pub mod aggregate;
pub mod engine;
pub mod tcp;
pub mod traits;

pub use aggregate::{OutcomeCounts, ResultAggregate};
pub use engine::{scan, ScanEngine, ScanOrder, ScanRequest, ScanResult, ScanStatus};
pub use tcp::TcpConnectProbe;
pub use traits::{PortOutcome, PortState, Probe};
