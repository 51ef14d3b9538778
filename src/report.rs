//! Scan reports.
//!
//! A `ScanReport` is the serializable, output-facing view of a [`ScanResult`]:
//! it adds the scan ID, timestamps, the original target text and service
//! labels. Reports are rendered to stdout and never written to disk.

use crate::scanner::{PortOutcome, PortState, ScanResult, ScanStatus};
use crate::services::get_service_description;
use crate::types::{ScanId, ScanTarget};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One row of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortEntry {
    pub port: u16,
    pub state: PortState,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&PortOutcome> for PortEntry {
    fn from(outcome: &PortOutcome) -> Self {
        let port = outcome.port.as_u16();
        Self {
            port,
            state: outcome.state,
            service: get_service_description(port).to_string(),
            error: outcome.error.clone(),
        }
    }
}

/// A finished (or interrupted) scan, ready for output.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub id: ScanId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Target as typed by the operator.
    pub target: String,
    pub ip_address: String,
    pub port_range: String,
    pub status: ScanStatus,
    pub total_ports: usize,
    pub ports_scanned: usize,
    pub open_ports: usize,
    pub closed_ports: usize,
    pub error_ports: usize,
    pub duration_ms: u64,
    pub results: Vec<PortEntry>,
}

impl ScanReport {
    pub fn new(
        id: ScanId,
        target: &ScanTarget,
        started_at: DateTime<Utc>,
        result: &ScanResult,
    ) -> Self {
        Self {
            id,
            started_at,
            completed_at: Utc::now(),
            target: target.original.clone(),
            ip_address: target.ip.to_string(),
            port_range: result.range.to_string(),
            status: result.status,
            total_ports: result.total_ports,
            ports_scanned: result.scanned,
            open_ports: result.open_ports.len(),
            closed_ports: result.closed_count,
            error_ports: result.error_count,
            duration_ms: result.elapsed.as_millis() as u64,
            results: result.outcomes.iter().map(PortEntry::from).collect(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ScanStatus::Cancelled
    }

    /// One-line summary of the scan.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) - {} open, {} closed, {} errors, {}/{} ports [{:.2}s]",
            self.target,
            self.ip_address,
            self.open_ports,
            self.closed_ports,
            self.error_ports,
            self.ports_scanned,
            self.total_ports,
            self.duration_ms as f64 / 1000.0
        )
    }
}
