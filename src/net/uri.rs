//! Rendezvous URI: `SCHEME://<PSK-HEX>@<ADDRESS>:<PORT>`.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

/// Longest textual IPv6 address plus NUL, as `INET6_ADDRSTRLEN`.
const INET6_ADDRSTRLEN: usize = 46;

/// Capacity of the URI buffer: address, scheme and punctuation, PSK hex.
pub const URI_CAPACITY: usize = INET6_ADDRSTRLEN + 25 + 32;

/// Shortest URI considered plausible.
pub const URI_MIN_LEN: usize = 5;

/// Errors that can occur while building or parsing a rendezvous URI.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UriError {
    #[error("Rendezvous URI would be truncated ({len} bytes, capacity {capacity})")]
    Overflow { len: usize, capacity: usize },

    #[error("Rendezvous URI is way too small ({0} bytes)")]
    Underflow(usize),

    #[error("Malformed rendezvous URI: {0}")]
    Malformed(String),
}

/// Formats the rendezvous URI, bracketing IPv6 addresses.
///
/// The length checks run after formatting and guard the size constants, not
/// user input.
pub fn build_uri(scheme: &str, psk_hex: &str, ip: IpAddr, port: u16) -> Result<String, UriError> {
    let uri = match ip {
        IpAddr::V4(v4) => format!("{}://{}@{}:{}", scheme, psk_hex, v4, port),
        IpAddr::V6(v6) => format!("{}://{}@[{}]:{}", scheme, psk_hex, v6, port),
    };

    if uri.len() >= URI_CAPACITY - 1 {
        return Err(UriError::Overflow {
            len: uri.len(),
            capacity: URI_CAPACITY,
        });
    }
    if uri.len() < URI_MIN_LEN {
        return Err(UriError::Underflow(uri.len()));
    }

    Ok(uri)
}

/// The parts of a rendezvous URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendezvousUri {
    pub scheme: String,
    pub psk_hex: String,
    pub addr: SocketAddr,
}

impl RendezvousUri {
    pub fn new(scheme: impl Into<String>, psk_hex: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            scheme: scheme.into(),
            psk_hex: psk_hex.into(),
            addr,
        }
    }

    /// Formats this URI with [`build_uri`].
    pub fn build(&self) -> Result<String, UriError> {
        build_uri(&self.scheme, &self.psk_hex, self.addr.ip(), self.addr.port())
    }

    /// Parses a URI produced by [`build_uri`].
    pub fn parse(text: &str) -> Result<Self, UriError> {
        let (scheme, rest) = text
            .split_once("://")
            .ok_or_else(|| UriError::Malformed("missing scheme separator".to_string()))?;
        let (psk_hex, host) = rest
            .split_once('@')
            .ok_or_else(|| UriError::Malformed("missing '@'".to_string()))?;

        if scheme.is_empty() {
            return Err(UriError::Malformed("empty scheme".to_string()));
        }
        if psk_hex.is_empty() || !psk_hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(UriError::Malformed(format!("bad PSK '{}'", psk_hex)));
        }

        // SocketAddr parsing already requires brackets around v6 and rejects
        // them around v4.
        let addr: SocketAddr = host
            .parse()
            .map_err(|e| UriError::Malformed(format!("bad address '{}': {}", host, e)))?;

        Ok(Self::new(scheme, psk_hex, addr))
    }
}

impl fmt::Display for RendezvousUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.addr.ip() {
            IpAddr::V4(v4) => write!(f, "{}://{}@{}:", self.scheme, self.psk_hex, v4)?,
            IpAddr::V6(v6) => write!(f, "{}://{}@[{}]:", self.scheme, self.psk_hex, v6)?,
        }
        write!(f, "{}", self.addr.port())
    }
}
