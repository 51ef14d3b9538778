//! Output formatting module.
//!
//! Provides the live progress reporter and formatters for plain text, JSON,
//! and CSV output of scan reports.

mod csv_format;
mod json_format;
mod plain;
mod progress;

pub use csv_format::{print_csv, write_csv};
pub use json_format::{print_json, write_json};
pub use plain::{
    print_error, print_info, print_plain, print_scan_header, print_success, print_warning,
    write_plain,
};
pub use progress::{LiveOptions, ProgressReporter};

use crate::cli::OutputFormat;
use crate::report::ScanReport;
use std::io;

/// Format and print a scan report according to the specified format.
pub fn format_results(report: &ScanReport, format: OutputFormat, show_closed: bool) -> io::Result<()> {
    match format {
        OutputFormat::Plain => plain::print_plain(report, show_closed),
        OutputFormat::Json => json_format::print_json(report),
        OutputFormat::Csv => csv_format::print_csv(report),
    }
}
