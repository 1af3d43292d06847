//! One pairing run, from key generation to teardown.
//!
//! [`Pairing`] owns everything the run needs: the configuration, the PSK,
//! the TLS context and the session. Setup happens in [`Pairing::prepare`] so
//! that any failure aborts before the URI is shown to the user.

use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::Arc;

use openssl::error::ErrorStack;
use openssl::ssl::SslContext;
use thiserror::Error;
use tracing::info;

use crate::config::PairingConfig;
use crate::crypto::{PreSharedKey, PskError};
use crate::net::{select_bind_address, AddressError, BindAddress, RendezvousUri, UriError};
use crate::qr::{print_qr, QrError};
use crate::session::{server_context, tls::GNUTLS_PRIORITY, Session, SessionError};
use crate::transfer::{receive_key, send_key, PairingRole, TransferError};

/// Any failure of a pairing run.
#[derive(Error, Debug)]
pub enum PairingError {
    #[error("PSK error: {0}")]
    Psk(#[from] PskError),

    #[error("Address selection error: {0}")]
    Address(#[from] AddressError),

    #[error("URI error: {0}")]
    Uri(#[from] UriError),

    #[error("QR error: {0}")]
    Qr(#[from] QrError),

    #[error("Failed to set up TLS context: {0}")]
    Tls(#[from] ErrorStack),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A listening pairing endpoint, ready to be announced and run.
pub struct Pairing {
    config: PairingConfig,
    psk: Arc<PreSharedKey>,
    context: SslContext,
    session: Session,
    rendezvous: RendezvousUri,
    uri: String,
}

impl Pairing {
    /// Generates a fresh PSK and sets up the listener.
    pub fn prepare(config: PairingConfig) -> Result<Self, PairingError> {
        let psk = PreSharedKey::generate()?;
        Self::with_psk(config, psk)
    }

    /// Sets up the listener using a caller-supplied PSK.
    pub fn with_psk(config: PairingConfig, psk: PreSharedKey) -> Result<Self, PairingError> {
        let psk = Arc::new(psk);

        let bind = match config.bind {
            Some(ip) => {
                info!("binding to {} as requested", ip);
                BindAddress::from_ip(ip)
            }
            None => select_bind_address()?,
        };

        let context = server_context(Arc::clone(&psk))?;

        let mut session = Session::new();
        let local = session.listen(&bind)?;
        info!("listening on {}", local);

        let rendezvous = RendezvousUri::new(config.scheme.clone(), psk.hex(), local);
        let uri = rendezvous.build()?;

        Ok(Self {
            config,
            psk,
            context,
            session,
            rendezvous,
            uri,
        })
    }

    pub fn config(&self) -> &PairingConfig {
        &self.config
    }

    /// Parsed form of the URI: scheme, PSK hex and bound address.
    pub fn rendezvous(&self) -> &RendezvousUri {
        &self.rendezvous
    }

    /// The formatted rendezvous URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.rendezvous.addr
    }

    /// Companion command for a GnuTLS client to connect by hand.
    pub fn companion_command(&self) -> String {
        format!(
            "gnutls-cli --debug {} --priority {} --port {} --pskusername {} --pskkey {} {}",
            self.config.debug_level,
            GNUTLS_PRIORITY,
            self.rendezvous.addr.port(),
            self.config.identity_hint,
            self.psk.hex(),
            self.rendezvous.addr.ip()
        )
    }

    /// Prints the URI, its QR code and the companion command to `out`.
    pub fn announce<W: Write>(&self, out: &mut W) -> Result<(), PairingError> {
        writeln!(out, "{}", self.uri)?;
        print_qr(&self.uri, self.config.qr_margin, out)?;
        writeln!(out, "{}", self.companion_command())?;
        out.flush()?;
        Ok(())
    }

    /// Serves the single peer and moves the key in the direction given by
    /// `role`. Received key bytes go to `out`, after the connection notice.
    ///
    /// Returns the number of key bytes transferred.
    pub fn run<W: Write>(mut self, role: PairingRole, out: &mut W) -> Result<u64, PairingError> {
        let peer = self.session.accept()?;
        self.session.handshake(&self.context)?;

        writeln!(out, "A connection was made from {}!", peer)?;
        out.flush()?;

        let chunk_size = self.config.chunk_size;
        let channel = self.session.channel()?;

        let moved = match role {
            PairingRole::Sender(mut source) => {
                info!("trying to write {} to client", source.label());
                send_key(source.reader(), channel, chunk_size)?
            }
            PairingRole::Receiver => {
                info!("waiting to receive key");
                receive_key(channel, out, chunk_size)?
            }
        };

        info!("transferred {} octets, closing", moved);
        self.session.close()?;
        Ok(moved)
    }
}
