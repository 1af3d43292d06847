//! QR display of the rendezvous URI.
//!
//! The `qrcode` crate turns the URI into a module matrix; this module renders
//! that matrix on the terminal with Unicode half blocks, two matrix rows per
//! text line.

mod matrix;
mod render;

pub use matrix::ModuleMatrix;
pub use render::{glyph_bits, glyph_code, render, render_with_margin, DEFAULT_MARGIN, GLYPHS};

use thiserror::Error;

/// Errors that can occur while encoding or printing a QR code.
#[derive(Error, Debug)]
pub enum QrError {
    #[error("Failed to encode string as QR code: {0}")]
    Encoding(String),

    #[error("Module matrix of width {width} cannot hold {cells} cells")]
    InvalidMatrix { width: usize, cells: usize },

    #[error("Failed writing QR code ({region}): {source}")]
    RenderIo {
        region: String,
        #[source]
        source: std::io::Error,
    },
}

/// Encodes `text` and renders it to `out` with the given margin.
pub fn print_qr<W: std::io::Write>(text: &str, margin: usize, out: &mut W) -> Result<(), QrError> {
    let matrix = ModuleMatrix::encode(text)?;
    render_with_margin(&matrix, margin, out)
}
