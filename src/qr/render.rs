//! Terminal rendering of a module matrix with half-block glyphs.
//!
//! Two matrix rows make one printed row. Each printed cell is keyed by
//! `n = (top << 1) | bottom`:
//!
//! | n | top   | bottom | glyph            |
//! |---|-------|--------|------------------|
//! | 0 | light | light  | `█` full block   |
//! | 1 | light | dark   | `▀` upper half   |
//! | 2 | dark  | light  | `▄` lower half   |
//! | 3 | dark  | dark   | space            |
//!
//! Blocks stand for light modules, so the code reads correctly on a terminal
//! with a dark background. The margin is drawn with full blocks too.

use std::io::Write;

use tracing::warn;

use super::{ModuleMatrix, QrError};

/// Glyphs indexed by the 2-bit cell code.
pub const GLYPHS: [&str; 4] = [
    "\u{2588}", // FULL BLOCK
    "\u{2580}", // UPPER HALF BLOCK
    "\u{2584}", // LOWER HALF BLOCK
    " ",
];

/// Margin around the matrix, in printed rows.
pub const DEFAULT_MARGIN: usize = 2;

/// Cell code for matrix column `x` and the row pair starting at `y`.
///
/// Past the last row the bottom bit is light.
pub fn glyph_code(matrix: &ModuleMatrix, x: usize, y: usize) -> usize {
    let top = matrix.is_dark(x, y) as usize;
    let bottom = if y + 1 < matrix.width() {
        matrix.is_dark(x, y + 1) as usize
    } else {
        0
    };
    (top << 1) | bottom
}

/// Inverse of [`glyph_code`]: `(top_dark, bottom_dark)` for a glyph.
pub fn glyph_bits(glyph: &str) -> Option<(bool, bool)> {
    let n = GLYPHS.iter().position(|g| *g == glyph)?;
    Some((n & 0b10 != 0, n & 0b01 != 0))
}

fn put<W: Write>(out: &mut W, data: &str, region: impl FnOnce() -> String) -> Result<(), QrError> {
    out.write_all(data.as_bytes())
        .map_err(|source| QrError::RenderIo {
            region: region(),
            source,
        })
}

/// Renders `matrix` with the default margin.
pub fn render<W: Write>(matrix: &ModuleMatrix, out: &mut W) -> Result<(), QrError> {
    render_with_margin(matrix, DEFAULT_MARGIN, out)
}

/// Renders `matrix` surrounded by `margin` rows of full blocks above and below
/// and `2 * margin` columns on each side.
///
/// Any failed write aborts rendering. A failed flush is only logged since the
/// whole bitmap has already been handed to the writer.
pub fn render_with_margin<W: Write>(
    matrix: &ModuleMatrix,
    margin: usize,
    out: &mut W,
) -> Result<(), QrError> {
    let width = matrix.width();
    let full = GLYPHS[0];
    let side = full.repeat(margin * 2);
    let margin_row = full.repeat(width + margin * 4);

    put(out, "\n", || "start of qrcode".to_string())?;

    for _ in 0..margin {
        put(out, &margin_row, || "upper margin".to_string())?;
        put(out, "\n", || "newline in upper margin".to_string())?;
    }

    for y in (0..width).step_by(2) {
        put(out, &side, || format!("left margin in row {}", y))?;
        for x in 0..width {
            let n = glyph_code(matrix, x, y);
            put(out, GLYPHS[n], || format!("module ({},{})", x, y))?;
        }
        put(out, &side, || format!("right margin in row {}", y))?;
        put(out, "\n", || format!("newline after row {}", y))?;
    }

    for _ in 0..margin {
        put(out, &margin_row, || "lower margin".to_string())?;
        put(out, "\n", || "newline in lower margin".to_string())?;
    }

    if let Err(e) = out.flush() {
        warn!("failed to flush QR code stream: {}", e);
    }

    Ok(())
}
