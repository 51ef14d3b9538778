//! JSON output formatting.

use crate::report::ScanReport;
use std::io::{self, Write};

/// Print the report as pretty JSON to stdout.
pub fn print_json(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_json(&mut out, report)
}

pub fn write_json<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}
