//! Key material for a pairing run.
//!
//! This module provides:
//! - Pre-shared key generation (16 random bytes, uppercase hex form)

pub mod psk;

pub use psk::{PreSharedKey, PskError, PSK_BYTES, PSK_HEX_LEN};
