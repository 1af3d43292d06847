//! # openpgp-skt - Secure key transfer for OpenPGP
//!
//! Moves one OpenPGP key between this host and a nearby device (typically a
//! phone) without any prior trust setup.
//!
//! ## Overview
//!
//! - A fresh 128-bit **pre-shared key** is generated for every run
//! - The host listens on one non-loopback interface, on an OS-assigned port
//! - `OPENPGP+SKT://<PSK>@<addr>:<port>` is printed as text and as a **QR code**
//! - The peer scans the code and connects with **TLS-PSK**; exactly one peer
//!   is served
//! - The key is then sent from a file or stdin, or received to stdout
//!
//! ## Security Model
//!
//! - **Possession of the PSK** is the only authentication; no certificates
//! - **Ephemeral key exchange**: TLS 1.2 offers only ECDHE-PSK suites
//! - **One shot**: the listener is closed after the first connection
//! - The PSK lives in zeroized memory and is never logged
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use openpgp_skt::config::PairingConfig;
//! use openpgp_skt::pairing::Pairing;
//! use openpgp_skt::transfer::PairingRole;
//!
//! let pairing = Pairing::prepare(PairingConfig::default()).unwrap();
//!
//! let mut out = std::io::stdout();
//! pairing.announce(&mut out).unwrap();
//!
//! // Blocks until the peer connects, then sends the key file.
//! let role = PairingRole::from_arg(Some("alice.asc"));
//! pairing.run(role, &mut out).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`crypto`]: Pre-shared key generation and hex encoding
//! - [`net`]: Interface selection and the rendezvous URI
//! - [`qr`]: Terminal QR rendering
//! - [`session`]: Listener, TLS-PSK handshake and the secure channel
//! - [`transfer`]: Sending and receiving the key
//! - [`pairing`]: One complete run tying the above together

pub mod config;
pub mod crypto;
pub mod net;
pub mod pairing;
pub mod qr;
pub mod session;
pub mod transfer;

// Re-export commonly used types at the crate root
pub use config::PairingConfig;
pub use crypto::{PreSharedKey, PskError};
pub use net::{BindAddress, RendezvousUri};
pub use pairing::{Pairing, PairingError};
pub use qr::QrError;
pub use session::{SecureChannel, Session, SessionError, SessionState};
pub use transfer::{KeySource, PairingRole, TransferError};
