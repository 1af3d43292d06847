//! Pairing configuration.

use std::net::IpAddr;

/// Default URI scheme.
pub const DEFAULT_SCHEME: &str = "OPENPGP+SKT";

/// Default PSK identity hint; also the identity the companion client sends.
pub const DEFAULT_IDENTITY_HINT: &str = "openpgp-skt";

/// Default transfer chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = crate::transfer::CHUNK_SIZE;

/// Default quiet zone around the QR code, in modules.
pub const DEFAULT_QR_MARGIN: usize = crate::qr::DEFAULT_MARGIN;

/// Default `--debug` level printed in the companion command.
pub const DEFAULT_DEBUG_LEVEL: u8 = 4;

/// Configuration for one pairing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingConfig {
    /// Scheme of the rendezvous URI.
    pub scheme: String,

    /// Identity the peer is expected to present. Only logged.
    pub identity_hint: String,

    /// Bytes moved per read or write during the transfer.
    pub chunk_size: usize,

    /// QR quiet zone in modules.
    pub qr_margin: usize,

    /// Debug level passed to the companion client command.
    pub debug_level: u8,

    /// Bind to this address instead of picking an interface.
    pub bind: Option<IpAddr>,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            identity_hint: DEFAULT_IDENTITY_HINT.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            qr_margin: DEFAULT_QR_MARGIN,
            debug_level: DEFAULT_DEBUG_LEVEL,
            bind: None,
        }
    }
}

impl PairingConfig {
    /// Default configuration bound to `ip`.
    pub fn bound_to(ip: IpAddr) -> Self {
        Self {
            bind: Some(ip),
            ..Self::default()
        }
    }
}
