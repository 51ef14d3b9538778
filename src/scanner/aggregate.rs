//! Thread-safe store of per-port outcomes for one scan.

use crate::scanner::traits::{PortOutcome, PortState};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Tally of recorded outcomes by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub open: usize,
    pub closed: usize,
    pub error: usize,
}

impl OutcomeCounts {
    pub fn total(&self) -> usize {
        self.open + self.closed + self.error
    }
}

/// Outcomes keyed by port.
///
/// Counts and the open-port set are derived from the map on demand, so they
/// can never drift from the recorded outcomes. One lock guards the map; it is
/// held only for an insert or a read, never across I/O.
#[derive(Debug, Default)]
pub struct ResultAggregate {
    outcomes: Mutex<BTreeMap<u16, PortOutcome>>,
}

impl ResultAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome. Returns false, keeping the first outcome, if the
    /// port was already recorded.
    pub fn record(&self, outcome: PortOutcome) -> bool {
        let mut outcomes = self.lock();
        let port = outcome.port.as_u16();
        if outcomes.contains_key(&port) {
            tracing::warn!(port, "duplicate outcome ignored");
            return false;
        }
        outcomes.insert(port, outcome);
        true
    }

    /// Ascending list of ports recorded as open.
    pub fn open_ports_so_far(&self) -> Vec<u16> {
        self.lock()
            .values()
            .filter(|o| o.is_open())
            .map(|o| o.port.as_u16())
            .collect()
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.lock()
            .values()
            .fold(OutcomeCounts::default(), |mut counts, o| {
                match o.state {
                    PortState::Open => counts.open += 1,
                    PortState::Closed => counts.closed += 1,
                    PortState::Error => counts.error += 1,
                }
                counts
            })
    }

    /// Consume the aggregate, returning outcomes sorted by port.
    pub fn into_outcomes(self) -> Vec<PortOutcome> {
        self.outcomes
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .into_values()
            .collect()
    }

    // A panic while holding the lock cannot leave the map half-written, so
    // a poisoned lock is still safe to read.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<u16, PortOutcome>> {
        self.outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
