//! Bounded-concurrency scan engine.
//!
//! One probe task per port, gated by a semaphore holding `concurrency`
//! permits. The dispatch loop also drains completed tasks, so every outcome
//! is recorded and reported as soon as its probe returns, in whatever order
//! the probes finish.

use crate::error::ScanError;
use crate::scanner::aggregate::ResultAggregate;
use crate::scanner::tcp::TcpConnectProbe;
use crate::scanner::traits::{PortOutcome, PortState, Probe};
use crate::types::{Port, PortRange};
use futures::FutureExt;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::any::Any;
use std::net::IpAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Order in which ports are handed to probes. Never affects the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrder {
    /// Ascending port order.
    #[default]
    Serial,
    /// Shuffled once per scan.
    Random,
}

/// Input of one scan.
///
/// Port bounds are kept raw so that out-of-range values can be represented
/// and rejected by [`ScanRequest::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub host: IpAddr,
    pub start_port: u32,
    pub end_port: u32,
    pub timeout: Duration,
    pub concurrency: usize,
    /// Keep closed outcomes in [`ScanResult::outcomes`].
    pub include_closed: bool,
    pub order: ScanOrder,
}

impl ScanRequest {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
    pub const DEFAULT_CONCURRENCY: usize = 100;

    pub fn new(host: IpAddr, start_port: u32, end_port: u32) -> Self {
        Self {
            host,
            start_port,
            end_port,
            timeout: Self::DEFAULT_TIMEOUT,
            concurrency: Self::DEFAULT_CONCURRENCY,
            include_closed: false,
            order: ScanOrder::Serial,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_closed(mut self, include_closed: bool) -> Self {
        self.include_closed = include_closed;
        self
    }

    pub fn with_order(mut self, order: ScanOrder) -> Self {
        self.order = order;
        self
    }

    /// Check the request and return the port range it covers.
    pub fn validate(&self) -> Result<PortRange, ScanError> {
        let range = PortRange::from_bounds(self.start_port, self.end_port).map_err(|_| {
            ScanError::InvalidRange {
                start: self.start_port,
                end: self.end_port,
            }
        })?;
        if self.concurrency == 0 {
            return Err(ScanError::InvalidConcurrency(self.concurrency));
        }
        if self.timeout.is_zero() {
            return Err(ScanError::InvalidTimeout);
        }
        Ok(range)
    }
}

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// Every port in the range produced an outcome.
    Complete,
    /// Dispatch stopped early; only `scanned` ports have outcomes.
    Cancelled,
}

/// Output of one scan. Owned by the caller; the engine keeps nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub host: IpAddr,
    pub range: PortRange,
    /// Ascending ports whose outcome was Open.
    pub open_ports: Vec<u16>,
    /// Ports in the requested range.
    pub total_ports: usize,
    /// Ports that produced an outcome.
    pub scanned: usize,
    pub closed_count: usize,
    pub error_count: usize,
    /// From first dispatch to last completion.
    pub elapsed: Duration,
    pub status: ScanStatus,
    /// Open and Error outcomes by port, plus Closed ones if requested.
    pub outcomes: Vec<PortOutcome>,
}

impl ScanResult {
    pub fn is_complete(&self) -> bool {
        self.status == ScanStatus::Complete
    }

    /// Turn a cancelled result into [`ScanError::Cancelled`].
    pub fn into_complete(self) -> Result<Self, ScanError> {
        match self.status {
            ScanStatus::Complete => Ok(self),
            ScanStatus::Cancelled => Err(ScanError::Cancelled {
                scanned: self.scanned,
                total: self.total_ports,
            }),
        }
    }
}

/// Dispatches probes for a port range under a concurrency budget.
pub struct ScanEngine<P> {
    probe: Arc<P>,
}

impl ScanEngine<TcpConnectProbe> {
    /// Engine backed by real TCP connect probes.
    pub fn tcp() -> Self {
        Self::new(TcpConnectProbe::new())
    }
}

impl<P: Probe + 'static> ScanEngine<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe: Arc::new(probe),
        }
    }

    /// Scan to completion without live reporting.
    pub async fn scan(&self, request: &ScanRequest) -> Result<ScanResult, ScanError> {
        self.scan_with(request, &CancellationToken::new(), |_, _, _| {})
            .await
    }

    /// Scan, calling `on_outcome(outcome, scanned, total)` after each outcome
    /// is recorded.
    ///
    /// `on_outcome` runs on the dispatch loop and should return quickly.
    /// Once `cancel` fires, no new probe starts; probes already running
    /// finish (within their timeout) and are recorded before this returns.
    pub async fn scan_with<F>(
        &self,
        request: &ScanRequest,
        cancel: &CancellationToken,
        mut on_outcome: F,
    ) -> Result<ScanResult, ScanError>
    where
        F: FnMut(&PortOutcome, usize, usize),
    {
        let range = request.validate()?;
        let total = range.len();

        let mut ports: Vec<Port> = range.iter().collect();
        if request.order == ScanOrder::Random {
            ports.shuffle(&mut rand::thread_rng());
        }
        let mut pending = ports.into_iter();

        tracing::info!(
            host = %request.host,
            range = %range,
            concurrency = request.concurrency,
            timeout_ms = request.timeout.as_millis() as u64,
            "starting scan"
        );

        let budget = Arc::new(Semaphore::new(request.concurrency));
        let aggregate = ResultAggregate::new();
        let mut in_flight: JoinSet<PortOutcome> = JoinSet::new();
        let mut scanned = 0usize;
        let mut cancelled = false;
        let mut first_dispatch: Option<Instant> = None;
        let mut last_completion: Option<Instant> = None;

        loop {
            if !cancelled && cancel.is_cancelled() {
                tracing::info!(scanned, total, "cancellation requested, dispatch stopped");
                cancelled = true;
            }
            let dispatching = !cancelled && !pending.as_slice().is_empty();
            if !dispatching && in_flight.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled(), if dispatching => {}

                Some(joined) = in_flight.join_next() => {
                    last_completion = Some(Instant::now());
                    match joined {
                        Ok(outcome) => {
                            if aggregate.record(outcome.clone()) {
                                scanned += 1;
                                on_outcome(&outcome, scanned, total);
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "probe task did not complete"),
                    }
                }

                permit = Arc::clone(&budget).acquire_owned(), if dispatching => {
                    let Ok(permit) = permit else {
                        tracing::error!("concurrency budget closed mid-scan");
                        cancelled = true;
                        continue;
                    };
                    let Some(port) = pending.next() else {
                        continue;
                    };
                    first_dispatch.get_or_insert_with(Instant::now);

                    let probe = Arc::clone(&self.probe);
                    let host = request.host;
                    let limit = request.timeout;
                    in_flight.spawn(
                        async move {
                            let _permit = permit;
                            AssertUnwindSafe(probe.attempt(host, port, limit))
                                .catch_unwind()
                                .await
                                .unwrap_or_else(|panic| {
                                    PortOutcome::error(port, panic_message(panic.as_ref()))
                                })
                        }
                        .in_current_span(),
                    );
                    tracing::trace!(port = port.as_u16(), "dispatched");
                }
            }
        }

        let elapsed = match (first_dispatch, last_completion) {
            (Some(first), Some(last)) => last.saturating_duration_since(first),
            _ => Duration::ZERO,
        };
        let counts = aggregate.counts();
        let open_ports = aggregate.open_ports_so_far();
        let outcomes: Vec<PortOutcome> = aggregate
            .into_outcomes()
            .into_iter()
            .filter(|o| request.include_closed || o.state != PortState::Closed)
            .collect();

        let status = if scanned == total {
            ScanStatus::Complete
        } else {
            ScanStatus::Cancelled
        };

        tracing::info!(
            scanned,
            total,
            open = counts.open,
            closed = counts.closed,
            errors = counts.error,
            elapsed_ms = elapsed.as_millis() as u64,
            ?status,
            "scan finished"
        );

        Ok(ScanResult {
            host: request.host,
            range,
            open_ports,
            total_ports: total,
            scanned,
            closed_count: counts.closed,
            error_count: counts.error,
            elapsed,
            status,
            outcomes,
        })
    }
}

/// Scan `host` with TCP connect probes.
///
/// `host` must be an IP literal; hostnames go through
/// [`TargetSpec::resolve`](crate::types::TargetSpec::resolve) first.
pub async fn scan(
    host: &str,
    start_port: u32,
    end_port: u32,
    concurrency: usize,
    timeout: Duration,
    include_closed: bool,
    on_outcome: Option<&mut dyn FnMut(&PortOutcome, usize, usize)>,
) -> Result<ScanResult, ScanError> {
    let ip: IpAddr = host.trim().parse().map_err(|_| ScanError::ResolutionFailed {
        target: host.to_string(),
        reason: "expected an IP address; resolve hostnames first".to_string(),
    })?;

    let request = ScanRequest::new(ip, start_port, end_port)
        .with_concurrency(concurrency)
        .with_timeout(timeout)
        .with_closed(include_closed);

    let engine = ScanEngine::tcp();
    let cancel = CancellationToken::new();
    match on_outcome {
        Some(callback) => engine.scan_with(&request, &cancel, callback).await,
        None => engine.scan_with(&request, &cancel, |_, _, _| {}).await,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("probe panicked: {}", detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::Rng;
    use std::collections::HashSet;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    const HOST: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10));

    /// Deterministic probe: fixed open/error sets, optional random delay,
    /// and counters for how many probes run at once.
    #[derive(Default)]
    struct StubProbe {
        open: HashSet<u16>,
        errors: HashSet<u16>,
        max_delay_ms: u64,
        calls: AtomicUsize,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl StubProbe {
        fn with_open(ports: &[u16]) -> Self {
            Self {
                open: ports.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn delayed(mut self, max_delay_ms: u64) -> Self {
            self.max_delay_ms = max_delay_ms;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }

        fn expected_state(&self, port: u16) -> PortState {
            if self.open.contains(&port) {
                PortState::Open
            } else if self.errors.contains(&port) {
                PortState::Error
            } else {
                PortState::Closed
            }
        }
    }

    #[async_trait]
    impl Probe for StubProbe {
        async fn attempt(&self, _host: IpAddr, port: Port, _timeout: Duration) -> PortOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if self.max_delay_ms > 0 {
                let delay = rand::thread_rng().gen_range(0..=self.max_delay_ms);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            } else {
                tokio::task::yield_now().await;
            }

            self.running.fetch_sub(1, Ordering::SeqCst);
            match self.expected_state(port.as_u16()) {
                PortState::Open => PortOutcome::open(port),
                PortState::Closed => PortOutcome::closed(port),
                PortState::Error => PortOutcome::error(port, "stubbed failure"),
            }
        }
    }

    struct PanickyProbe;

    #[async_trait]
    impl Probe for PanickyProbe {
        async fn attempt(&self, _host: IpAddr, port: Port, _timeout: Duration) -> PortOutcome {
            if port.as_u16() == 13 {
                panic!("socket exploded");
            }
            PortOutcome::closed(port)
        }
    }

    #[tokio::test]
    async fn test_every_port_recorded_exactly_once() {
        let engine = ScanEngine::new(StubProbe::with_open(&[7, 300]).delayed(3));
        let request = ScanRequest::new(HOST, 1, 500)
            .with_concurrency(32)
            .with_closed(true)
            .with_order(ScanOrder::Random);

        let mut seen = HashSet::new();
        let result = engine
            .scan_with(&request, &CancellationToken::new(), |outcome, _, _| {
                assert!(seen.insert(outcome.port.as_u16()), "duplicate {}", outcome.port);
            })
            .await
            .unwrap();

        assert_eq!(engine.probe.calls(), 500);
        assert_eq!(seen.len(), 500);
        assert_eq!(result.scanned, 500);
        assert_eq!(result.total_ports, 500);
        assert_eq!(result.outcomes.len(), 500);
        assert!(result
            .outcomes
            .windows(2)
            .all(|w| w[0].port < w[1].port));
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_open_ports_independent_of_completion_order() {
        let open = [22, 80, 81, 443, 8080];
        let engine = ScanEngine::new(StubProbe::with_open(&open).delayed(5));
        let request = ScanRequest::new(HOST, 1, 9000)
            .with_concurrency(200)
            .with_order(ScanOrder::Random);

        let result = engine.scan(&request).await.unwrap();
        assert_eq!(result.open_ports, open.to_vec());
        assert_eq!(result.closed_count, 9000 - open.len());
    }

    #[tokio::test]
    async fn test_concurrency_budget_respected() {
        for concurrency in [1usize, 5, 100] {
            let engine = ScanEngine::new(StubProbe::default().delayed(2));
            let ports = (concurrency * 4).max(40) as u32;
            let request = ScanRequest::new(HOST, 1, ports).with_concurrency(concurrency);

            let result = engine.scan(&request).await.unwrap();
            assert_eq!(result.scanned, ports as usize);
            assert!(
                engine.probe.peak() <= concurrency,
                "peak {} exceeded budget {}",
                engine.probe.peak(),
                concurrency
            );
            assert!(engine.probe.peak() >= 1);
        }
    }

    #[tokio::test]
    async fn test_repeated_scans_are_identical() {
        let mut stub = StubProbe::with_open(&[21, 22, 3306]).delayed(2);
        stub.errors = [25, 110].into_iter().collect();
        let engine = ScanEngine::new(stub);
        let request = ScanRequest::new(HOST, 1, 400)
            .with_concurrency(50)
            .with_order(ScanOrder::Random);

        let first = engine.scan(&request).await.unwrap();
        let second = engine.scan(&request).await.unwrap();

        assert_eq!(first.open_ports, second.open_ports);
        assert_eq!(first.outcomes, second.outcomes);
        assert_eq!(first.closed_count, second.closed_count);
        assert_eq!(first.error_count, 2);
        assert_eq!(second.error_count, 2);
        assert_eq!(first.scanned, second.scanned);
    }

    #[tokio::test]
    async fn test_validation_runs_no_probes() {
        let engine = ScanEngine::new(StubProbe::default());
        let cases = [
            (
                ScanRequest::new(HOST, 0, 100),
                ScanError::InvalidRange { start: 0, end: 100 },
            ),
            (
                ScanRequest::new(HOST, 1, 70000),
                ScanError::InvalidRange {
                    start: 1,
                    end: 70000,
                },
            ),
            (
                ScanRequest::new(HOST, 100, 50),
                ScanError::InvalidRange {
                    start: 100,
                    end: 50,
                },
            ),
            (
                ScanRequest::new(HOST, 1, 10).with_concurrency(0),
                ScanError::InvalidConcurrency(0),
            ),
            (
                ScanRequest::new(HOST, 1, 10).with_timeout(Duration::ZERO),
                ScanError::InvalidTimeout,
            ),
        ];

        for (request, expected) in cases {
            let err = assert_err!(engine.scan(&request).await);
            assert_eq!(err, expected);
        }
        assert_eq!(engine.probe.calls(), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_with_two_open_ports() {
        let engine = ScanEngine::new(StubProbe::with_open(&[80, 443]));
        let request = ScanRequest::new(HOST, 1, 1000).with_concurrency(50);

        let result = assert_ok!(engine.scan(&request).await);
        assert_eq!(result.open_ports, vec![80, 443]);
        assert_eq!(result.closed_count, 998);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.scanned, 1000);
        // Closed outcomes are not kept unless asked for.
        assert_eq!(result.outcomes.len(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_returns_partial_result() {
        let engine = ScanEngine::new(StubProbe::with_open(&[5, 999]).delayed(2));
        let request = ScanRequest::new(HOST, 1, 1000)
            .with_concurrency(5)
            .with_closed(true);
        let cancel = CancellationToken::new();

        let result = engine
            .scan_with(&request, &cancel, |_, scanned, _| {
                if scanned == 10 {
                    cancel.cancel();
                }
            })
            .await
            .unwrap();

        assert_eq!(result.status, ScanStatus::Cancelled);
        assert!(result.scanned >= 10);
        assert!(result.scanned < 1000);
        assert!(result.scanned <= 10 + request.concurrency);
        assert_eq!(engine.probe.calls(), result.scanned);
        assert_eq!(result.outcomes.len(), result.scanned);
        for outcome in &result.outcomes {
            assert_eq!(outcome.state, engine.probe.expected_state(outcome.port.as_u16()));
        }

        let err = result.into_complete().unwrap_err();
        assert!(matches!(err, ScanError::Cancelled { total: 1000, .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_dispatches_nothing() {
        let engine = ScanEngine::new(StubProbe::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = engine
            .scan_with(&ScanRequest::new(HOST, 1, 100), &cancel, |_, _, _| {})
            .await
            .unwrap();
        assert_eq!(result.scanned, 0);
        assert_eq!(result.status, ScanStatus::Cancelled);
        assert_eq!(engine.probe.calls(), 0);
    }

    #[tokio::test]
    async fn test_panicking_probe_becomes_error_outcome() {
        let engine = ScanEngine::new(PanickyProbe);
        let request = ScanRequest::new(HOST, 10, 20).with_concurrency(4);

        let result = engine.scan(&request).await.unwrap();
        assert!(result.is_complete());
        assert_eq!(result.scanned, 11);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.outcomes.len(), 1);
        let failed = &result.outcomes[0];
        assert_eq!(failed.port.as_u16(), 13);
        assert_eq!(
            failed.error.as_deref(),
            Some("probe panicked: socket exploded")
        );
    }

    #[tokio::test]
    async fn test_progress_counter_is_monotonic() {
        let engine = ScanEngine::new(StubProbe::default().delayed(1));
        let request = ScanRequest::new(HOST, 1000, 1099).with_concurrency(10);

        let mut last = 0;
        let result = engine
            .scan_with(&request, &CancellationToken::new(), |_, scanned, total| {
                assert_eq!(total, 100);
                assert_eq!(scanned, last + 1);
                last = scanned;
            })
            .await
            .unwrap();
        assert_eq!(last, 100);
        assert_eq!(result.scanned, 100);
    }

    #[tokio::test]
    async fn test_free_function_rejects_hostname() {
        let err = scan("example.com", 1, 10, 5, Duration::from_millis(50), false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::ResolutionFailed { .. }));
    }
}
