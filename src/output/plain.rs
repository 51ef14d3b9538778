//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::report::{PortEntry, ScanReport};
use crate::scanner::PortState;
use console::{style, Style};
use std::io::{self, Write};
use std::time::Duration;

const HEAVY_RULE: &str = "════════════════════════════════════════════════════════════";
const LIGHT_RULE: &str = "────────────────────────────────────────────────────────────";

/// Print the end-of-scan summary to stdout.
pub fn print_plain(report: &ScanReport, show_closed: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_plain(&mut out, report, show_closed)
}

/// Write the end-of-scan summary.
pub fn write_plain<W: Write>(out: &mut W, report: &ScanReport, show_closed: bool) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(HEAVY_RULE).blue())?;
    writeln!(out, "{}", style("SCAN SUMMARY").bold())?;
    writeln!(out, "{}", style(LIGHT_RULE).blue())?;

    writeln!(out, "Target:       {}", style(&report.target).bold())?;
    if report.target != report.ip_address {
        writeln!(out, "IP Address:   {}", style(&report.ip_address).bold())?;
    }
    writeln!(out, "Port Range:   {}", style(&report.port_range).bold())?;
    writeln!(
        out,
        "Scan Time:    {}",
        style(format!("{:.2} seconds", report.duration_ms as f64 / 1000.0)).bold()
    )?;
    writeln!(out, "Total Ports:  {}", style(report.total_ports).bold())?;
    if report.is_cancelled() {
        writeln!(
            out,
            "Scanned:      {}",
            style(report.ports_scanned).yellow().bold()
        )?;
    }
    writeln!(out, "Open Ports:   {}", style(report.open_ports).green().bold())?;
    writeln!(out, "Closed Ports: {}", style(report.closed_ports).red().bold())?;
    if report.error_ports > 0 {
        writeln!(out, "Errors:       {}", style(report.error_ports).yellow().bold())?;
    }

    let rows: Vec<&PortEntry> = report
        .results
        .iter()
        .filter(|e| show_closed || e.state != PortState::Closed)
        .collect();

    if !rows.is_empty() {
        writeln!(out, "{}", style(LIGHT_RULE).cyan())?;
        writeln!(out, "{}", style("PORT DETAILS").bold())?;
        writeln!(out, "{}", style(LIGHT_RULE).cyan())?;
        writeln!(
            out,
            "  {:>9}  {:<7}  {}",
            style("PORT").bold(),
            style("STATE").bold(),
            style("SERVICE").bold()
        )?;
        for entry in rows {
            let state_style = match entry.state {
                PortState::Open => Style::new().green().bold(),
                PortState::Closed => Style::new().red(),
                PortState::Error => Style::new().yellow(),
            };
            write!(
                out,
                "  {:>9}  {:<7}  {}",
                format!("{}/tcp", entry.port),
                state_style.apply_to(entry.state.to_string()),
                entry.service
            )?;
            match &entry.error {
                Some(error) => writeln!(out, "  {}", style(error).dim())?,
                None => writeln!(out)?,
            }
        }
    }

    writeln!(out, "{}", style(HEAVY_RULE).blue())?;
    Ok(())
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(
    target: &str,
    ip: &str,
    port_range: &str,
    concurrency: usize,
    timeout: Duration,
) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("tcpsweep").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    if target != ip {
        println!(
            "{} {} {} {}",
            style("•").dim(),
            style(target).white().bold(),
            style("→").dim(),
            ip
        );
    }
    println!("{} Target: {}", style("•").dim(), style(ip).white().bold());
    println!(
        "{} Port range: {}",
        style("•").dim(),
        style(port_range).white().bold()
    );
    println!(
        "{} Concurrency: {}",
        style("•").dim(),
        style(concurrency).white().bold()
    );
    println!(
        "{} Timeout: {}",
        style("•").dim(),
        style(format!("{}ms", timeout.as_millis())).white().bold()
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}
