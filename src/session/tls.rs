//! TLS-PSK server policy and handshake driver.
//!
//! Only PSK key exchange is offered: TLS 1.2 with ECDHE-PSK suites and
//! TLS 1.3 (whose PSK path OpenSSL serves through the same callback). No
//! certificates, no session tickets, no renegotiation.

use std::net::TcpStream;
use std::sync::Arc;

use openssl::error::ErrorStack;
use openssl::ssl::{
    ErrorCode, Ssl, SslContext, SslContextBuilder, SslMethod, SslOptions, SslStream, SslVersion,
};
use tracing::debug;

use super::{CredentialError, SessionError};
use crate::crypto::PreSharedKey;

/// TLS 1.2 cipher list: ephemeral ECDH authenticated by the PSK.
pub const TLS12_PSK_CIPHERS: &str =
    "ECDHE-PSK-CHACHA20-POLY1305:ECDHE-PSK-AES256-CBC-SHA384:ECDHE-PSK-AES128-CBC-SHA256";

/// TLS 1.3 suites. The PSK callback path needs a SHA-256 suite.
pub const TLS13_CIPHERSUITES: &str = "TLS_AES_128_GCM_SHA256:TLS_CHACHA20_POLY1305_SHA256";

/// GnuTLS priority string describing the same policy, for the companion
/// command line.
pub const GNUTLS_PRIORITY: &str = "NORMAL:-CTYPE-ALL\
:%SERVER_PRECEDENCE:%NO_TICKETS\
:-VERS-TLS1.0:-VERS-TLS1.1:-VERS-DTLS1.0:-VERS-DTLS1.2\
:-CURVE-SECP224R1:-CURVE-SECP192R1\
:-SIGN-ALL\
:-KX-ALL:+ECDHE-PSK:+DHE-PSK\
:-3DES-CBC:-CAMELLIA-128-CBC:-CAMELLIA-256-CBC";

/// Supplies the PSK to the TLS engine during the handshake.
///
/// `identity` is whatever the peer declared. It is attacker controlled and
/// must not influence which key is returned.
pub trait PskCredentials: Send + Sync {
    /// Copies the key into `out` and returns its length.
    fn fill_psk(&self, identity: Option<&[u8]>, out: &mut [u8]) -> Result<usize, CredentialError>;
}

impl PskCredentials for PreSharedKey {
    fn fill_psk(&self, _identity: Option<&[u8]>, out: &mut [u8]) -> Result<usize, CredentialError> {
        let key = self.as_bytes();
        if out.len() < key.len() {
            return Err(CredentialError::OutOfMemory {
                needed: key.len(),
                available: out.len(),
            });
        }
        out[..key.len()].copy_from_slice(key);
        Ok(key.len())
    }
}

impl<T: PskCredentials + ?Sized> PskCredentials for Arc<T> {
    fn fill_psk(&self, identity: Option<&[u8]>, out: &mut [u8]) -> Result<usize, CredentialError> {
        (**self).fill_psk(identity, out)
    }
}

/// Restricts a context to PSK-only, TLS 1.2+ and strong ciphers.
pub fn apply_psk_policy(builder: &mut SslContextBuilder) -> Result<(), ErrorStack> {
    builder.set_min_proto_version(Some(SslVersion::TLS1_2))?;
    builder.set_cipher_list(TLS12_PSK_CIPHERS)?;
    builder.set_ciphersuites(TLS13_CIPHERSUITES)?;
    builder.set_options(
        SslOptions::NO_TICKET
            | SslOptions::CIPHER_SERVER_PREFERENCE
            | SslOptions::NO_RENEGOTIATION
            | SslOptions::NO_COMPRESSION,
    );
    Ok(())
}

/// Builds the server context with `credentials` bound as the PSK callback.
pub fn server_context<C>(credentials: C) -> Result<SslContext, ErrorStack>
where
    C: PskCredentials + 'static,
{
    let mut builder = SslContext::builder(SslMethod::tls_server())?;
    apply_psk_policy(&mut builder)?;

    builder.set_psk_server_callback(move |_ssl, identity, psk_out| {
        // Logged escaped, never parsed: these are raw bytes from the network.
        debug!(
            "peer sent PSK identity: {}",
            identity.unwrap_or_default().escape_ascii()
        );
        credentials.fill_psk(identity, psk_out).map_err(|e| {
            debug!("PSK credential lookup failed: {}", e);
            ErrorStack::get()
        })
    });

    Ok(builder.build())
}

/// Whether a TLS error only asks for the same call to be repeated.
pub fn is_transient(err: &openssl::ssl::Error) -> bool {
    let code = err.code();
    if code == ErrorCode::WANT_READ || code == ErrorCode::WANT_WRITE {
        return true;
    }
    code == ErrorCode::SYSCALL
        && err.io_error().is_some_and(|io| {
            matches!(
                io.kind(),
                std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock
            )
        })
}

/// Runs the server side of the handshake on `stream`, repeating the step while
/// the engine reports transient conditions.
pub fn accept_tls(
    context: &SslContext,
    stream: TcpStream,
) -> Result<SslStream<TcpStream>, SessionError> {
    let ssl = Ssl::new(context)?;
    let mut tls = SslStream::new(ssl, stream)?;

    loop {
        match tls.accept() {
            Ok(()) => break,
            Err(e) if is_transient(&e) => {
                debug!("TLS handshake returned: {} (retrying)", e);
            }
            Err(e) => return Err(SessionError::Handshake(e)),
        }
    }

    debug!(
        "TLS handshake complete: {} {}",
        tls.ssl().version_str(),
        tls.ssl()
            .current_cipher()
            .map(|c| c.name())
            .unwrap_or("<no cipher>")
    );

    Ok(tls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_psk_copies_key() {
        let psk = PreSharedKey::from_hex("AABBCCDD00112233445566778899AABB").unwrap();
        let mut out = [0u8; 64];
        let n = psk.fill_psk(Some(&b"anything"[..]), &mut out).unwrap();
        assert_eq!(n, 16);
        assert_eq!(&out[..16], psk.as_bytes());
        assert!(out[16..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_fill_psk_ignores_identity() {
        let psk = PreSharedKey::from_hex("AABBCCDD00112233445566778899AABB").unwrap();
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        psk.fill_psk(Some(&b"openpgp-skt"[..]), &mut a).unwrap();
        psk.fill_psk(Some(&b"\xff\x00%s%n"[..]), &mut b).unwrap();
        assert_eq!(a, b);
        let mut c = [0u8; 16];
        psk.fill_psk(None, &mut c).unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn test_fill_psk_small_buffer() {
        let psk = PreSharedKey::from_hex("AABBCCDD00112233445566778899AABB").unwrap();
        let mut out = [0u8; 8];
        assert_eq!(
            psk.fill_psk(None, &mut out),
            Err(CredentialError::OutOfMemory {
                needed: 16,
                available: 8
            })
        );
    }

    #[test]
    fn test_server_context_builds() {
        let psk = Arc::new(PreSharedKey::generate().unwrap());
        assert!(server_context(psk).is_ok());
    }
}
