//! Pre-shared key generation.
//!
//! The PSK is the only secret of a pairing run. It is drawn once from the OS
//! CSPRNG, printed (as uppercase hex) inside the rendezvous URI, handed to the
//! TLS engine through the credential callback, and zeroized on drop.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

/// Length of the PSK in bytes.
pub const PSK_BYTES: usize = 16;

/// Length of the hex form of the PSK in characters.
pub const PSK_HEX_LEN: usize = PSK_BYTES * 2;

/// Errors that can occur while producing a PSK.
#[derive(Error, Debug)]
pub enum PskError {
    #[error("Failed to get randomness: {0}")]
    RandomnessUnavailable(#[from] rand::Error),

    #[error("Bad calculation for PSK size: expected {expected} hex chars, got {got}")]
    EncodingLength { expected: usize, got: usize },

    #[error("Invalid PSK hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Invalid PSK length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// A 16-byte pre-shared key together with its uppercase hex form.
pub struct PreSharedKey {
    bytes: Zeroizing<[u8; PSK_BYTES]>,
    hex: Zeroizing<String>,
}

impl std::fmt::Debug for PreSharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreSharedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl PreSharedKey {
    /// Draws a fresh key from the OS random source.
    pub fn generate() -> Result<Self, PskError> {
        let mut bytes = Zeroizing::new([0u8; PSK_BYTES]);
        OsRng.try_fill_bytes(&mut bytes[..])?;
        Self::from_array(bytes)
    }

    /// Builds a key from its hex form. Either case is accepted; the stored
    /// form is always uppercase.
    pub fn from_hex(text: &str) -> Result<Self, PskError> {
        let mut decoded = hex::decode(text.trim())?;
        if decoded.len() != PSK_BYTES {
            let got = decoded.len();
            decoded.zeroize();
            return Err(PskError::InvalidLength {
                expected: PSK_BYTES,
                got,
            });
        }

        let mut bytes = Zeroizing::new([0u8; PSK_BYTES]);
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Self::from_array(bytes)
    }

    fn from_array(bytes: Zeroizing<[u8; PSK_BYTES]>) -> Result<Self, PskError> {
        let hex = Zeroizing::new(hex::encode_upper(&bytes[..]));

        // Guards against the byte length and the text length drifting apart.
        if hex.len() != PSK_HEX_LEN {
            return Err(PskError::EncodingLength {
                expected: PSK_HEX_LEN,
                got: hex.len(),
            });
        }

        Ok(Self { bytes, hex })
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PSK_BYTES] {
        &self.bytes
    }

    /// Uppercase hex form, as printed in the rendezvous URI.
    pub fn hex(&self) -> &str {
        &self.hex
    }
}
