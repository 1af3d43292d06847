//! # Secure session
//!
//! One listener, one peer, one TLS-PSK channel. The [`Session`] walks the
//! states in [`SessionState`] and owns every socket it opens, so all of them
//! are released on any exit path.
//!
//! ## Flow
//!
//! 1. [`Session::listen`] binds an OS-assigned port and listens with no backlog
//! 2. [`Session::accept`] blocks for the single peer and closes the listener
//! 3. [`Session::handshake`] runs the server handshake with the PSK callback
//! 4. [`Session::channel`] hands the established channel to the transfer loop
//! 5. [`Session::close`] sends `close_notify` and drops the connection

mod channel;
mod error;
mod listener;
mod state;
pub mod tls;

pub use channel::{RecordError, SecureChannel, TlsChannel};
pub use error::{CredentialError, SessionError};
pub use listener::open_listener;
pub use state::SessionState;
pub use tls::{server_context, PskCredentials};

use std::net::{SocketAddr, TcpListener, TcpStream};

use openssl::ssl::SslContext;
use tracing::{debug, info, warn};

use crate::net::BindAddress;

/// The pairing session state machine.
pub struct Session {
    state: SessionState,
    local_addr: Option<SocketAddr>,
    peer_addr: Option<SocketAddr>,
    listener: Option<TcpListener>,
    accepted: Option<TcpStream>,
    channel: Option<TlsChannel>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session in the `Created` state.
    pub fn new() -> Self {
        Self {
            state: SessionState::Created,
            local_addr: None,
            peer_addr: None,
            listener: None,
            accepted: None,
            channel: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Address actually bound, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Address of the accepted peer.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    fn require(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.state != expected {
            return Err(SessionError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn advance(&mut self, next: SessionState) {
        debug_assert!(self.state.can_advance_to(next));
        debug!("session {} -> {}", self.state, next);
        self.state = next;
    }

    /// Moves to `Failed`, releases every resource and hands back `err`.
    fn fail(&mut self, err: SessionError) -> SessionError {
        self.advance(SessionState::Failed);
        self.listener = None;
        self.accepted = None;
        self.channel = None;
        err
    }

    /// `Created → Listening`: bind `bind` with port 0 and listen.
    ///
    /// Returns the bound address with the port the OS picked.
    pub fn listen(&mut self, bind: &BindAddress) -> Result<SocketAddr, SessionError> {
        self.require(SessionState::Created)?;

        match open_listener(bind) {
            Ok((listener, local)) => {
                self.listener = Some(listener);
                self.local_addr = Some(local);
                self.advance(SessionState::Listening);
                Ok(local)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// `Listening → Accepted`: block until one peer connects, then close the
    /// listening socket. There is no timeout.
    pub fn accept(&mut self) -> Result<SocketAddr, SessionError> {
        self.require(SessionState::Listening)?;

        let result = match &self.listener {
            Some(listener) => listener.accept().map_err(SessionError::Accept),
            None => Err(SessionError::Accept(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "listening socket is gone",
            ))),
        };

        // At most one peer is ever served.
        self.listener = None;

        match result {
            Ok((stream, peer)) => {
                debug!("accepted TCP connection from {}", peer);
                self.accepted = Some(stream);
                self.peer_addr = Some(peer);
                self.advance(SessionState::Accepted);
                Ok(peer)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// `Accepted → Handshaking → Established`: run the server handshake on the
    /// accepted socket using `context` (see [`server_context`]).
    pub fn handshake(&mut self, context: &SslContext) -> Result<(), SessionError> {
        self.require(SessionState::Accepted)?;
        self.advance(SessionState::Handshaking);

        let stream = match self.accepted.take() {
            Some(stream) => stream,
            None => {
                return Err(self.fail(SessionError::Accept(std::io::Error::new(
                    std::io::ErrorKind::NotConnected,
                    "accepted socket is gone",
                ))))
            }
        };

        match tls::accept_tls(context, stream) {
            Ok(tls) => {
                let channel = TlsChannel::new(tls);
                info!("secure channel established ({})", channel.protocol());
                self.channel = Some(channel);
                self.advance(SessionState::Established);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// The established channel.
    pub fn channel(&mut self) -> Result<&mut TlsChannel, SessionError> {
        self.require(SessionState::Established)?;
        let actual = self.state;
        self.channel.as_mut().ok_or(SessionError::InvalidState {
            expected: SessionState::Established,
            actual,
        })
    }

    /// `Established → Closed`: best-effort graceful shutdown. A failed
    /// `close_notify` is logged, not returned.
    pub fn close(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::Established)?;

        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.close() {
                warn!("failed to shut down secure channel: {}", e);
            }
        }
        self.advance(SessionState::Closed);
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.as_mut() {
            if let Err(e) = channel.close() {
                debug!("shutdown on drop failed: {}", e);
            }
        }
    }
}
