//! filecache - command-line front end for the file-backed cache
//!
//! filecache provides:
//! - get/set/delete/has over a cache directory
//! - clear, list and sweep of the whole directory
//! - non-blocking advisory locks shared with other processes

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use filecache::cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);
    cli::run(cli)
}

/// Log to stderr so stdout stays machine-readable
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("filecache=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
