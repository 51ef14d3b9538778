//! Command-line interface definitions for tcpsweep.
//!
//! Uses `clap` derive macros for declarative argument parsing. Unset options
//! fall back to the settings file, then to built-in defaults.

mod scan;

pub use scan::ScanOptions;

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// A bounded-concurrency TCP connect port scanner.
///
/// Only scan systems you own or are authorized to test.
#[derive(Parser, Debug)]
#[command(name = "tcpsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scan a host for open TCP ports", long_about = None)]
#[command(after_help = "EXAMPLES:\n    tcpsweep 192.168.1.1 1 1000\n    tcpsweep example.com 80 443\n    tcpsweep 127.0.0.1 20 80 --timeout 2000 --concurrency 50 --verbose\n    tcpsweep scanme.nmap.org 1 1000 --show-closed")]
pub struct Cli {
    /// Target IP address or hostname to scan
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// First port of the range (1-65535)
    #[arg(value_name = "START_PORT")]
    pub start_port: u32,

    /// Last port of the range (1-65535)
    #[arg(value_name = "END_PORT")]
    pub end_port: u32,

    /// Connection timeout in milliseconds [default: 1000]
    #[arg(short = 't', long, env = "TCPSWEEP_TIMEOUT", value_name = "MS")]
    pub timeout: Option<u64>,

    /// Maximum number of simultaneous connection attempts [default: 100]
    #[arg(
        short = 'c',
        long,
        visible_alias = "threads",
        env = "TCPSWEEP_CONCURRENCY",
        value_name = "N"
    )]
    pub concurrency: Option<usize>,

    /// Report closed ports as well as open ones
    #[arg(long, env = "TCPSWEEP_SHOW_CLOSED", action = ArgAction::SetTrue)]
    pub show_closed: bool,

    /// Print per-port errors and debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress the header, progress bar and live port lines
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format for results [default: plain]
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Probe ports in random order instead of ascending
    #[arg(long)]
    pub random_order: bool,

    /// Path to a settings file (JSON)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from(["tcpsweep", "192.168.1.1", "1", "1000"]).unwrap();
        assert_eq!(cli.target, "192.168.1.1");
        assert_eq!(cli.start_port, 1);
        assert_eq!(cli.end_port, 1000);
        assert_eq!(cli.timeout, None);
        assert!(!cli.show_closed);
    }

    #[test]
    fn test_options_and_threads_alias() {
        let cli = Cli::try_parse_from([
            "tcpsweep",
            "example.com",
            "80",
            "443",
            "--timeout",
            "2000",
            "--threads",
            "50",
            "--show-closed",
            "-o",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.timeout, Some(2000));
        assert_eq!(cli.concurrency, Some(50));
        assert!(cli.show_closed);
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }

    #[test]
    fn test_out_of_range_ports_still_parse() {
        // Range checks belong to request validation, not argument parsing.
        let cli = Cli::try_parse_from(["tcpsweep", "10.0.0.1", "0", "70000"]).unwrap();
        assert_eq!((cli.start_port, cli.end_port), (0, 70000));
    }

    #[test]
    fn test_env_fallbacks_are_declared() {
        use clap::CommandFactory;

        let command = Cli::command();
        let env_of = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .map(|env| env.to_string_lossy().into_owned())
        };
        assert_eq!(env_of("show_closed").as_deref(), Some("TCPSWEEP_SHOW_CLOSED"));
        assert_eq!(env_of("timeout").as_deref(), Some("TCPSWEEP_TIMEOUT"));
        assert_eq!(env_of("concurrency").as_deref(), Some("TCPSWEEP_CONCURRENCY"));
    }

    #[test]
    fn test_missing_ports_rejected() {
        assert!(Cli::try_parse_from(["tcpsweep", "10.0.0.1"]).is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
