//! The scan command.
//!
//! Resolves the target, runs the engine with a live reporter, and prints the
//! final report. Ctrl-C stops dispatch and prints whatever was collected.

use crate::cli::{Cli, OutputFormat};
use crate::config::AppSettings;
use crate::error::{CliError, CliResult};
use crate::output::{self, LiveOptions, ProgressReporter};
use crate::report::ScanReport;
use crate::scanner::{ScanEngine, ScanOrder, ScanRequest, ScanStatus};
use crate::types::{ScanId, TargetSpec};
use chrono::Utc;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Above this, the OS is likely to run out of sockets.
const HIGH_CONCURRENCY: usize = 1000;

/// Command-line flags merged over the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub timeout: Duration,
    pub concurrency: usize,
    pub show_closed: bool,
    pub verbose: bool,
    pub quiet: bool,
    pub output: OutputFormat,
    pub order: ScanOrder,
}

impl ScanOptions {
    /// Live output only makes sense for the human-readable format.
    fn is_interactive(&self) -> bool {
        self.output == OutputFormat::Plain && !self.quiet
    }
}

impl Cli {
    /// Merge flags over `settings`; flags win.
    pub fn options(&self, settings: &AppSettings) -> CliResult<ScanOptions> {
        let output = match self.output {
            Some(format) => format,
            None => settings
                .default_output_format
                .parse()
                .map_err(CliError::Other)?,
        };

        Ok(ScanOptions {
            timeout: Duration::from_millis(self.timeout.unwrap_or(settings.default_timeout_ms)),
            concurrency: self.concurrency.unwrap_or(settings.default_concurrency),
            show_closed: self.show_closed || settings.show_closed,
            verbose: self.verbose || settings.verbose,
            quiet: self.quiet,
            output,
            order: if self.random_order || settings.random_order {
                ScanOrder::Random
            } else {
                ScanOrder::Serial
            },
        })
    }

    /// Run the scan described by the command line.
    pub async fn execute(&self) -> CliResult<ScanStatus> {
        let settings = AppSettings::load(self.config.as_deref())?;
        let options = self.options(&settings)?;

        let mut request = ScanRequest::new(
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            self.start_port,
            self.end_port,
        )
        .with_timeout(options.timeout)
        .with_concurrency(options.concurrency)
        .with_closed(options.show_closed)
        .with_order(options.order);

        // Reject bad input before any DNS traffic.
        let range = request.validate()?;

        if options.concurrency > HIGH_CONCURRENCY && !options.quiet {
            output::print_warning(&format!(
                "concurrency {} is high and may exhaust file descriptors",
                options.concurrency
            ));
        }

        let target = TargetSpec::parse(&self.target)?.resolve().await?;
        request.host = target.ip;

        if options.is_interactive() {
            output::print_scan_header(
                &target.original,
                &target.ip.to_string(),
                &range.to_string(),
                options.concurrency,
                options.timeout,
            );
            if options.order == ScanOrder::Random {
                output::print_info("Probing ports in random order");
            }
        }

        let reporter = if options.is_interactive() {
            ProgressReporter::new(
                target.ip,
                range.len(),
                LiveOptions {
                    show_closed: options.show_closed,
                    show_errors: options.verbose,
                },
            )
        } else {
            ProgressReporter::hidden(target.ip, range.len())
        };

        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupt received");
                    cancel.cancel();
                }
            }
        });

        let id = ScanId::new();
        let span = tracing::info_span!("scan", id = %id.short(), target = %target.original);
        let started_at = Utc::now();
        let scan_result = ScanEngine::tcp()
            .scan_with(&request, &cancel, |outcome, scanned, total| {
                reporter.on_outcome(outcome, scanned, total)
            })
            .instrument(span)
            .await;
        interrupt.abort();
        let result = scan_result?;

        let interrupted = !result.is_complete();
        reporter.finish(interrupted);

        let report = ScanReport::new(id, &target, started_at, &result);
        tracing::debug!(summary = %report.summary(), "report built");

        if interrupted && !options.quiet {
            output::print_warning("Scan interrupted by user");
            output::print_warning(&format!(
                "Showing partial results: {} of {} ports scanned",
                result.scanned, result.total_ports
            ));
        }

        output::format_results(&report, options.output, options.show_closed)?;

        if options.is_interactive() && !interrupted {
            if result.open_ports.is_empty() {
                output::print_warning("No open ports found in the specified range");
            } else {
                output::print_success("Scan completed successfully!");
            }
        }

        Ok(result.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["tcpsweep", "127.0.0.1", "1", "100"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_settings_fill_unset_flags() {
        let settings = AppSettings {
            default_concurrency: 300,
            default_timeout_ms: 250,
            show_closed: true,
            default_output_format: "csv".to_string(),
            ..AppSettings::default()
        };

        let options = cli(&[]).options(&settings).unwrap();
        assert_eq!(options.concurrency, 300);
        assert_eq!(options.timeout, Duration::from_millis(250));
        assert!(options.show_closed);
        assert_eq!(options.output, OutputFormat::Csv);
        assert_eq!(options.order, ScanOrder::Serial);
        assert!(!options.is_interactive());
    }

    #[test]
    fn test_flags_override_settings() {
        let options = cli(&["-c", "8", "-t", "50", "--random-order", "-o", "plain"])
            .options(&AppSettings::default())
            .unwrap();
        assert_eq!(options.concurrency, 8);
        assert_eq!(options.timeout, Duration::from_millis(50));
        assert_eq!(options.order, ScanOrder::Random);
        assert!(options.is_interactive());
    }

    #[test]
    fn test_bad_output_format_in_settings() {
        let settings = AppSettings {
            default_output_format: "yaml".to_string(),
            ..AppSettings::default()
        };
        let err = cli(&[]).options(&settings).unwrap_err();
        assert!(matches!(err, CliError::Other(_)));
    }

    #[tokio::test]
    async fn test_invalid_range_fails_before_resolution() {
        let cli = Cli::try_parse_from(["tcpsweep", "no-such-host.invalid", "100", "50", "-q"]).unwrap();
        let err = cli.execute().await.unwrap_err();
        assert!(matches!(
            err,
            CliError::Scan(crate::error::ScanError::InvalidRange { start: 100, end: 50 })
        ));
    }
}
