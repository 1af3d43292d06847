//! Listening socket setup.

use std::net::{SocketAddr, TcpListener};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::debug;

use super::SessionError;
use crate::net::{AddressFamily, BindAddress};

/// No queued connections beyond the one being accepted.
const LISTEN_BACKLOG: i32 = 0;

/// Opens a stream socket on `bind` with an OS-assigned port and starts
/// listening. Returns the listener and the address actually bound.
pub fn open_listener(bind: &BindAddress) -> Result<(TcpListener, SocketAddr), SessionError> {
    let mut addr = bind.addr;
    addr.set_port(0);

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(|source| SessionError::Socket {
            family: bind.family,
            source,
        })?;
    socket.set_reuse_address(true).map_err(SessionError::Bind)?;
    socket.bind(&addr.into()).map_err(SessionError::Bind)?;

    // Port 0 was requested, so the real port only exists after bind.
    let local = socket
        .local_addr()
        .map_err(SessionError::Bind)?
        .as_socket()
        .ok_or_else(|| {
            SessionError::Bind(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "bound socket has no inet address",
            ))
        })?;

    let got = AddressFamily::of(&local);
    if got != bind.family {
        return Err(SessionError::FamilyMismatch {
            expected: bind.family,
            got,
        });
    }

    socket.listen(LISTEN_BACKLOG).map_err(SessionError::Listen)?;
    debug!("listening on {}", local);

    Ok((socket.into(), local))
}
