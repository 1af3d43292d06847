//! Key transfer over the established channel.
//!
//! The direction is fixed by the [`PairingRole`]: a sender streams key bytes
//! from a file or stdin into the channel, a receiver streams the channel to
//! its output.

mod receiver;
mod role;
mod sender;

pub use receiver::receive_key;
pub use role::{KeySource, PairingRole};
pub use sender::send_key;

use thiserror::Error;

use crate::session::RecordError;

/// Largest chunk moved per read or write.
pub const CHUNK_SIZE: usize = 65536;

/// Errors that end a transfer.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Error reading from input: {0}")]
    SourceRead(#[source] std::io::Error),

    #[error("Failed to write to the secure channel: {0}")]
    ChannelWrite(#[source] RecordError),

    #[error("Failed to read from the secure channel: {0}")]
    ChannelRead(#[source] RecordError),

    #[error("Failed to write incoming record of size {size}: {source}")]
    OutputWrite {
        size: usize,
        #[source]
        source: std::io::Error,
    },
}
