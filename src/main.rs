//! openpgp-skt - OpenPGP key transfer over a QR-announced TLS-PSK channel
//!
//! Prints a URI carrying a fresh pre-shared key and the listening address,
//! both as text and as a terminal QR code, then serves exactly one peer.

mod commands;

use anyhow::Result;
use clap::Parser;

use commands::{CommandExecutor, PairCommand};

/// openpgp-skt - Secure key transfer for OpenPGP
///
/// Sends a key (from a file or standard input) to the device that scans the
/// QR code, or receives one from it when no key is given.
#[derive(Parser)]
#[command(name = "openpgp-skt")]
#[command(version)]
#[command(about = "Transfer an OpenPGP key over a TLS-PSK channel announced by QR code")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    pair: PairCommand,
}

/// Default log filter for the given number of `-v` flags.
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "openpgp_skt=warn",
        1 => "openpgp_skt=info",
        _ => "openpgp_skt=debug",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout carries the URI, the QR code and any
    // received key.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.pair.verbose).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    cli.pair.execute()
}
