//! Module matrix produced by the QR encoder.

use qrcode::{Color, EcLevel, QrCode};

use super::QrError;

/// A square grid of dark (`true`) and light (`false`) modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatrix {
    width: usize,
    cells: Vec<bool>,
}

impl ModuleMatrix {
    /// Wraps `cells` (row-major) as a `width`×`width` matrix.
    pub fn new(width: usize, cells: Vec<bool>) -> Result<Self, QrError> {
        if cells.len() != width * width {
            return Err(QrError::InvalidMatrix {
                width,
                cells: cells.len(),
            });
        }
        Ok(Self { width, cells })
    }

    /// Encodes `text` as a QR code in byte mode with low error correction.
    ///
    /// The URI carries punctuation, so alphanumeric mode cannot hold it.
    pub fn encode(text: &str) -> Result<Self, QrError> {
        let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::L)
            .map_err(|e| QrError::Encoding(e.to_string()))?;

        let width = code.width();
        let cells = code
            .to_colors()
            .into_iter()
            .map(|color| color == Color::Dark)
            .collect();

        Self::new(width, cells)
    }

    /// Side length in modules.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at column `x`, row `y` is dark. Out of range reads
    /// as light.
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.width {
            return false;
        }
        self.cells[y * self.width + x]
    }
}
