//! TCP connect probe.
//!
//! Uses the operating system's `connect()` to decide whether a port accepts
//! connections. Completes the full handshake, sends nothing, and closes the
//! socket straight away.

use crate::scanner::traits::{PortOutcome, Probe};
use crate::types::Port;
use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Probe that performs a plain TCP connect. Needs no privileges.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnectProbe;

impl TcpConnectProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for TcpConnectProbe {
    async fn attempt(&self, host: IpAddr, port: Port, limit: Duration) -> PortOutcome {
        let addr = SocketAddr::new(host, port.as_u16());
        let start = Instant::now();

        let outcome = settle(port, limit, TcpStream::connect(addr)).await;

        tracing::trace!(%addr, state = %outcome.state, "probe finished");
        outcome.with_elapsed(start.elapsed())
    }
}

/// Wait up to `limit` for `connect`. No answer in time counts as Closed.
async fn settle<F>(port: Port, limit: Duration, connect: F) -> PortOutcome
where
    F: Future<Output = io::Result<TcpStream>>,
{
    match timeout(limit, connect).await {
        Ok(Ok(stream)) => {
            drop(stream);
            PortOutcome::open(port)
        }
        Ok(Err(e)) => classify_connect_error(port, &e),
        Err(_) => PortOutcome::closed(port),
    }
}

/// Map a failed `connect()` to Closed or Error.
///
/// Anything that says "nobody is listening there" is Closed. Everything else
/// is a local or transport problem and is kept as Error with its message.
fn classify_connect_error(port: Port, e: &io::Error) -> PortOutcome {
    match e.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::TimedOut
        | io::ErrorKind::HostUnreachable
        | io::ErrorKind::NetworkUnreachable => PortOutcome::closed(port),
        _ => PortOutcome::error(port, e.to_string()),
    }
}
