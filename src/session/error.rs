//! Session error types.

use std::io;

use thiserror::Error;

use super::SessionState;
use crate::net::AddressFamily;

/// Errors that can occur while driving the session state machine.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Operation called in the wrong state.
    #[error("Session is {actual}, expected {expected}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    /// Allocating the listening socket failed.
    #[error("Failed to allocate a {family:?} socket: {source}")]
    Socket {
        family: AddressFamily,
        #[source]
        source: io::Error,
    },

    /// Setting options on, binding, or querying the listening socket failed.
    #[error("Failed to bind: {0}")]
    Bind(#[source] io::Error),

    /// The bound socket reported a different address family.
    #[error("Was expecting address family {expected:?} after binding, got {got:?}")]
    FamilyMismatch {
        expected: AddressFamily,
        got: AddressFamily,
    },

    /// `listen(2)` failed.
    #[error("Failed to listen: {0}")]
    Listen(#[source] io::Error),

    /// `accept(2)` failed.
    #[error("Failed to accept a connection: {0}")]
    Accept(#[source] io::Error),

    /// Building the TLS context or session failed.
    #[error("Failed to set up TLS: {0}")]
    Tls(#[from] openssl::error::ErrorStack),

    /// The handshake hit a fatal condition.
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] openssl::ssl::Error),
}

/// Errors the PSK credential callback can report to the TLS engine.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CredentialError {
    /// The engine's key buffer cannot hold a copy of the PSK.
    #[error("Out of memory: PSK needs {needed} bytes, buffer has {available}")]
    OutOfMemory { needed: usize, available: usize },
}
