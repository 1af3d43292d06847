//! Which way the key travels.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::warn;

/// Where a sender reads the key from.
pub struct KeySource {
    label: String,
    reader: Box<dyn Read + Send>,
}

impl KeySource {
    pub fn stdin() -> Self {
        Self::from_reader("<stdin>", io::stdin())
    }

    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::from_reader(path.display().to_string(), file))
    }

    pub fn from_reader(label: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self {
            label: label.into(),
            reader: Box::new(reader),
        }
    }

    /// Human-readable origin, for log lines.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn reader(&mut self) -> &mut (dyn Read + Send) {
        self.reader.as_mut()
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySource")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Direction of the transfer, fixed for the life of the process.
#[derive(Debug)]
pub enum PairingRole {
    /// Offer a key to the peer.
    Sender(KeySource),
    /// Accept a key from the peer and write it to the output.
    Receiver,
}

impl PairingRole {
    /// Picks the role from the optional command-line argument.
    ///
    /// No argument means receive. `-` sends from standard input; any other
    /// value is a path to send from. A path that cannot be opened is reported
    /// and the process falls back to receiving.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => Self::Receiver,
            Some("-") => Self::Sender(KeySource::stdin()),
            Some(path) => match KeySource::open(path) {
                Ok(source) => Self::Sender(source),
                Err(e) => {
                    warn!("could not open '{}' for reading: {}", path, e);
                    Self::Receiver
                }
            },
        }
    }

    pub fn is_sender(&self) -> bool {
        matches!(self, Self::Sender(_))
    }
}

impl fmt::Display for PairingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender(source) => write!(f, "sending {}", source.label()),
            Self::Receiver => write!(f, "receiving"),
        }
    }
}
