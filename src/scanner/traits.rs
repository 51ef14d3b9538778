//! Probe trait abstraction.
//!
//! Defines the single-port connection attempt the engine dispatches, and the
//! outcome record it produces. Keeping it behind a trait lets the engine be
//! driven by deterministic stubs in tests.

use crate::types::Port;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Classified state of one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    /// The remote end accepted the connection.
    Open,
    /// Refused, unreachable, or no answer within the timeout.
    Closed,
    /// Local or transport failure unrelated to the port itself.
    Error,
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Result of probing a single port. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortOutcome {
    pub port: Port,
    pub state: PortState,
    /// Description of the failure, for `Error` outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Time spent in the connection attempt.
    #[serde(skip)]
    pub elapsed: Duration,
}

impl PortOutcome {
    pub fn open(port: Port) -> Self {
        Self::with_state(port, PortState::Open)
    }

    pub fn closed(port: Port) -> Self {
        Self::with_state(port, PortState::Closed)
    }

    pub fn error(port: Port, description: impl Into<String>) -> Self {
        Self {
            error: Some(description.into()),
            ..Self::with_state(port, PortState::Error)
        }
    }

    fn with_state(port: Port, state: PortState) -> Self {
        Self {
            port,
            state,
            error: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Set the time the attempt took.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }
}

/// A single bounded-time connection attempt.
///
/// Implementations must never panic or return early without an outcome:
/// every failure is classified into the returned [`PortOutcome`].
#[async_trait]
pub trait Probe: Send + Sync {
    /// Attempt one connection to `host:port`, giving up after `timeout`.
    async fn attempt(&self, host: IpAddr, port: Port, timeout: Duration) -> PortOutcome;
}

#[async_trait]
impl<P: Probe + ?Sized> Probe for std::sync::Arc<P> {
    async fn attempt(&self, host: IpAddr, port: Port, timeout: Duration) -> PortOutcome {
        (**self).attempt(host, port, timeout).await
    }
}
