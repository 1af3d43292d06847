//! Encrypted record channel.
//!
//! [`SecureChannel`] is what the transfer loop talks to. Results follow the
//! transport's own classification: a transient [`RecordError`] means the same
//! call may simply be repeated.

use std::io;
use std::net::{SocketAddr, TcpStream};

use openssl::ssl::{ErrorCode, ShutdownResult, SslStream};
use thiserror::Error;
use tracing::debug;

use super::tls::is_transient;

/// Failure of a single record operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Resource temporarily unavailable, try again")]
    Again,

    #[error("Function was interrupted")]
    Interrupted,

    #[error("Peer requested a renegotiation")]
    Rehandshake,

    #[error("The TLS connection was non-properly terminated")]
    PrematureTermination,

    #[error("{0}")]
    Fatal(String),
}

impl RecordError {
    /// Whether repeating the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Again | Self::Interrupted)
    }
}

/// A reliable, encrypted byte channel to the peer.
pub trait SecureChannel {
    /// Sends a prefix of `data`, returning how many bytes were accepted.
    fn send(&mut self, data: &[u8]) -> Result<usize, RecordError>;

    /// Receives into `buf`. `Ok(0)` means the peer closed cleanly.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, RecordError>;

    /// Graceful shutdown of the channel.
    fn close(&mut self) -> Result<(), RecordError>;
}

/// [`SecureChannel`] over an OpenSSL stream.
pub struct TlsChannel {
    stream: SslStream<TcpStream>,
}

impl TlsChannel {
    pub fn new(stream: SslStream<TcpStream>) -> Self {
        Self { stream }
    }

    /// Negotiated protocol version, e.g. `TLSv1.3`.
    pub fn protocol(&self) -> &'static str {
        self.stream.ssl().version_str()
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.get_ref().peer_addr()
    }
}

fn classify(err: openssl::ssl::Error) -> RecordError {
    if is_transient(&err) {
        return match err.io_error().map(|io| io.kind()) {
            Some(io::ErrorKind::Interrupted) => RecordError::Interrupted,
            _ => RecordError::Again,
        };
    }

    let code = err.code();
    if code == ErrorCode::SYSCALL {
        return match err.io_error() {
            None => RecordError::PrematureTermination,
            Some(io) if io.kind() == io::ErrorKind::UnexpectedEof => {
                RecordError::PrematureTermination
            }
            Some(io) => RecordError::Fatal(io.to_string()),
        };
    }

    if code == ErrorCode::SSL {
        let reasons: Vec<&str> = err
            .ssl_error()
            .map(|stack| stack.errors().iter().filter_map(|e| e.reason()).collect())
            .unwrap_or_default();

        // OpenSSL 3 reports a missing close_notify as a protocol error.
        if reasons.iter().any(|r| r.contains("unexpected eof")) {
            return RecordError::PrematureTermination;
        }
        if reasons.iter().any(|r| r.contains("renegotiat")) {
            return RecordError::Rehandshake;
        }
    }

    RecordError::Fatal(err.to_string())
}

impl SecureChannel for TlsChannel {
    fn send(&mut self, data: &[u8]) -> Result<usize, RecordError> {
        self.stream.ssl_write(data).map_err(classify)
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, RecordError> {
        match self.stream.ssl_read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.code() == ErrorCode::ZERO_RETURN => Ok(0),
            Err(e) => Err(classify(e)),
        }
    }

    fn close(&mut self) -> Result<(), RecordError> {
        match self.stream.shutdown() {
            Ok(ShutdownResult::Sent) => debug!("close_notify sent"),
            Ok(ShutdownResult::Received) => debug!("close_notify exchanged"),
            Err(e) if e.code() == ErrorCode::ZERO_RETURN => {}
            Err(e) => return Err(classify(e)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RecordError::Again.is_transient());
        assert!(RecordError::Interrupted.is_transient());
        assert!(!RecordError::Rehandshake.is_transient());
        assert!(!RecordError::PrematureTermination.is_transient());
        assert!(!RecordError::Fatal("boom".to_string()).is_transient());
    }
}
