//! Sender side: key source into the channel.

use std::io::{ErrorKind, Read};

use tracing::debug;

use super::TransferError;
use crate::session::SecureChannel;

/// Offers `data` to the channel until all of it is accepted.
///
/// Partial writes are normal; only the unwritten remainder is offered again.
fn send_all<C>(channel: &mut C, data: &[u8]) -> Result<(), TransferError>
where
    C: SecureChannel + ?Sized,
{
    let mut remaining = data;

    while !remaining.is_empty() {
        match channel.send(remaining) {
            Ok(n) => remaining = &remaining[n..],
            Err(e) if e.is_transient() => debug!("send returned: {} (retrying)", e),
            Err(e) => return Err(TransferError::ChannelWrite(e)),
        }
    }

    Ok(())
}

/// Streams `source` into `channel` until end of input, reading at most
/// `chunk_size` bytes at a time.
///
/// Returns the number of bytes sent. The channel is not closed here; that is
/// part of session teardown.
pub fn send_key<R, C>(
    source: &mut R,
    channel: &mut C,
    chunk_size: usize,
) -> Result<u64, TransferError>
where
    R: Read + ?Sized,
    C: SecureChannel + ?Sized,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;

    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransferError::SourceRead(e)),
        };

        debug!("trying to write {} octets to client", n);
        send_all(channel, &buf[..n])?;
        total += n as u64;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RecordError;
    use crate::transfer::mock::{MockChannel, SendStep};
    use crate::transfer::CHUNK_SIZE;
    use std::io::{self, Cursor};

    #[test]
    fn test_empty_input_sends_nothing() {
        let mut channel = MockChannel::default();
        let sent = send_key(&mut io::empty(), &mut channel, CHUNK_SIZE).unwrap();
        assert_eq!(sent, 0);
        assert!(channel.sent.is_empty());
        assert!(channel.send_attempts.is_empty());
    }

    #[test]
    fn test_partial_write_remainder() {
        let data: Vec<u8> = (0..CHUNK_SIZE + 1).map(|i| (i % 251) as u8).collect();
        let mut channel = MockChannel::default();
        // First offer only takes 1000 bytes.
        channel.send_script.push_back(SendStep::Accept(1000));

        let mut source = Cursor::new(data.clone());
        let sent = send_key(&mut source, &mut channel, CHUNK_SIZE).unwrap();
        assert_eq!(sent, data.len() as u64);
        assert_eq!(channel.sent, data);

        assert!(channel.send_attempts.len() >= 2);
        assert_eq!(channel.send_attempts[0], CHUNK_SIZE);
        assert_eq!(channel.send_attempts[1], CHUNK_SIZE - 1000);
        assert_eq!(*channel.send_attempts.last().unwrap(), 1);
    }

    #[test]
    fn test_transient_errors_retry_same_bytes() {
        let mut channel = MockChannel::default();
        channel.send_script.push_back(SendStep::Fail(RecordError::Again));
        channel.send_script.push_back(SendStep::Accept(3));
        channel.send_script.push_back(SendStep::Fail(RecordError::Interrupted));

        let mut source = Cursor::new(b"hello-key".to_vec());
        let sent = send_key(&mut source, &mut channel, CHUNK_SIZE).unwrap();
        assert_eq!(sent, 9);
        assert_eq!(channel.sent, b"hello-key");
        assert_eq!(channel.send_attempts, vec![9, 9, 6, 6]);
    }

    #[test]
    fn test_fatal_write_error() {
        let mut channel = MockChannel::default();
        channel
            .send_script
            .push_back(SendStep::Fail(RecordError::Fatal("bad record mac".into())));

        let mut source = Cursor::new(b"key".to_vec());
        let err = send_key(&mut source, &mut channel, CHUNK_SIZE).unwrap_err();
        assert!(matches!(err, TransferError::ChannelWrite(RecordError::Fatal(_))));
    }

    struct BrokenSource;

    impl Read for BrokenSource {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn test_source_read_error() {
        let mut channel = MockChannel::default();
        let err = send_key(&mut BrokenSource, &mut channel, CHUNK_SIZE).unwrap_err();
        assert!(matches!(err, TransferError::SourceRead(_)));
    }
}
