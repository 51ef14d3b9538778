//! Live scan reporting.
//!
//! Consumes outcomes from the engine's callback while the scan runs: drives
//! a progress bar and prints one line per interesting port above it.

use crate::scanner::{PortOutcome, PortState};
use crate::services::get_service_description;
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::net::IpAddr;

/// Which outcomes get their own line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveOptions {
    pub show_closed: bool,
    pub show_errors: bool,
}

/// Renders outcomes as they arrive. Does not influence the scan.
pub struct ProgressReporter {
    bar: ProgressBar,
    host: IpAddr,
    options: LiveOptions,
    live: bool,
}

impl ProgressReporter {
    /// A visible reporter drawing to stderr.
    pub fn new(host: IpAddr, total: usize, options: LiveOptions) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(bar_style.progress_chars("█▓░"));
        }
        Self {
            bar,
            host,
            options,
            live: true,
        }
    }

    /// A reporter that draws and prints nothing, for machine-readable output.
    pub fn hidden(host: IpAddr, total: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total as u64);
        Self {
            bar,
            host,
            options: LiveOptions::default(),
            live: false,
        }
    }

    /// Engine callback: one outcome has been recorded.
    pub fn on_outcome(&self, outcome: &PortOutcome, scanned: usize, total: usize) {
        self.bar.set_position(scanned as u64);
        if !self.live {
            return;
        }
        if let Some(line) = self.line_for(outcome) {
            // No terminal to draw on: fall back to plain lines.
            if self.bar.is_hidden() {
                println!("{}", line);
            } else {
                self.bar.println(line);
            }
        }
        if scanned == total {
            self.bar.set_message("done");
        }
    }

    fn line_for(&self, outcome: &PortOutcome) -> Option<String> {
        let port = outcome.port.as_u16();
        match outcome.state {
            PortState::Open => Some(format!(
                "{} {}:{}/TCP Open {}",
                style("[+]").green().bold(),
                self.host,
                port,
                style(get_service_description(port)).bold()
            )),
            PortState::Closed if self.options.show_closed => Some(format!(
                "{} {}:{}/TCP Closed",
                style("[-]").red(),
                self.host,
                port
            )),
            PortState::Error if self.options.show_errors => Some(format!(
                "{} {}:{}/TCP Error {}",
                style("[!]").yellow(),
                self.host,
                port,
                style(outcome.error.as_deref().unwrap_or("unknown error")).dim()
            )),
            _ => None,
        }
    }

    /// Ports scanned so far, as shown on the bar.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Clear the bar once the scan has returned.
    pub fn finish(&self, interrupted: bool) {
        if interrupted {
            self.bar.abandon_with_message("interrupted");
        } else {
            self.bar.finish_and_clear();
        }
    }
}
