//! Pair command - hand an OpenPGP key to a phone, or take one from it.

use std::io::{self, Write};
use std::net::IpAddr;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use openpgp_skt::config::PairingConfig;
use openpgp_skt::pairing::Pairing;
use openpgp_skt::transfer::PairingRole;

use super::CommandExecutor;

/// Transfer an OpenPGP key over a TLS-PSK channel announced by QR code.
///
/// Scan the QR code with the other device, which connects back using the
/// pre-shared key embedded in the code. With KEY given, the key is sent;
/// without it, a key is received and written to standard output.
#[derive(Args, Debug)]
pub struct PairCommand {
    /// Key file to send, or `-` for standard input. Omit to receive.
    pub key: Option<String>,

    /// Listen on this address instead of picking a network interface
    #[arg(long, value_name = "IP")]
    pub bind: Option<IpAddr>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl PairCommand {
    fn config(&self) -> PairingConfig {
        PairingConfig {
            bind: self.bind,
            ..PairingConfig::default()
        }
    }
}

impl CommandExecutor for PairCommand {
    fn execute(&self) -> Result<()> {
        // Decide the direction first so a bad path is reported before the
        // URI is shown.
        let role = PairingRole::from_arg(self.key.as_deref());
        info!("role: {}", role);

        let pairing = Pairing::prepare(self.config()).context("Failed to set up pairing")?;

        let stdout = io::stdout();
        let mut out = stdout.lock();

        pairing
            .announce(&mut out)
            .context("Failed to show rendezvous information")?;

        let moved = pairing
            .run(role, &mut out)
            .context("Pairing failed")?;
        out.flush().context("Failed to flush standard output")?;

        info!("done, {} octets transferred", moved);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_flags() {
        let command = PairCommand {
            key: None,
            bind: Some("::1".parse().unwrap()),
            verbose: 0,
        };
        let config = command.config();
        assert_eq!(config.bind, command.bind);
        assert_eq!(config.scheme, "OPENPGP+SKT");
    }
}
