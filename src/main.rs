use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tcpsweep::cli::Cli;
use tcpsweep::output;
use tcpsweep::ScanStatus;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose).context("failed to initialise logging")?;

    match cli.execute().await {
        Ok(ScanStatus::Complete) => Ok(ExitCode::SUCCESS),
        Ok(ScanStatus::Cancelled) => Ok(ExitCode::FAILURE),
        Err(e) => {
            output::print_error(&e.to_string());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over the verbosity flag.
fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let fallback = if verbose { "tcpsweep=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}
