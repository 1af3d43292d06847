//! Receiver side: channel into the output.

use std::io::Write;

use tracing::{debug, warn};

use super::TransferError;
use crate::session::SecureChannel;

/// Copies records from `channel` to `out` until the peer closes, reading at
/// most `chunk_size` bytes per record call.
///
/// A zero-length read is the clean end. Transient conditions are logged and
/// the loop keeps reading; anything else, including a renegotiation request
/// or a connection dropped without `close_notify`, ends the transfer with
/// [`TransferError::ChannelRead`]. The bytes are written verbatim and not
/// interpreted.
pub fn receive_key<C, W>(
    channel: &mut C,
    out: &mut W,
    chunk_size: usize,
) -> Result<u64, TransferError>
where
    C: SecureChannel + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;

    loop {
        match channel.recv(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                out.write_all(&buf[..n])
                    .map_err(|source| TransferError::OutputWrite { size: n, source })?;
                total += n as u64;
                debug!("received {} octets", n);
            }
            Err(e) if e.is_transient() => warn!("got TLS error on recv: {}", e),
            Err(e) => return Err(TransferError::ChannelRead(e)),
        }
    }

    out.flush()
        .map_err(|source| TransferError::OutputWrite { size: 0, source })?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RecordError;
    use crate::transfer::CHUNK_SIZE;
    use crate::transfer::mock::{MockChannel, RecvStep};
    use std::io;

    #[test]
    fn test_concatenates_reads_in_order() {
        let chunks: Vec<Vec<u8>> = vec![
            b"-----BEGIN PGP ".to_vec(),
            b"PUBLIC KEY BLOCK-----\n".to_vec(),
            vec![0xA5; CHUNK_SIZE],
            b"\n-----END".to_vec(),
        ];
        let mut channel = MockChannel::default();
        for chunk in &chunks {
            channel.recv_script.push_back(RecvStep::Data(chunk.clone()));
        }

        let mut out = Vec::new();
        let total = receive_key(&mut channel, &mut out, CHUNK_SIZE).unwrap();

        assert_eq!(out, chunks.concat());
        assert_eq!(total, out.len() as u64);
    }

    #[test]
    fn test_immediate_close_is_success() {
        let mut channel = MockChannel::default();
        let mut out = Vec::new();
        assert_eq!(receive_key(&mut channel, &mut out, CHUNK_SIZE).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_transient_errors_continue() {
        let mut channel = MockChannel::default();
        channel.recv_script.push_back(RecvStep::Data(b"abc".to_vec()));
        channel.recv_script.push_back(RecvStep::Fail(RecordError::Again));
        channel.recv_script.push_back(RecvStep::Fail(RecordError::Interrupted));
        channel.recv_script.push_back(RecvStep::Data(b"def".to_vec()));

        let mut out = Vec::new();
        receive_key(&mut channel, &mut out, CHUNK_SIZE).unwrap();
        assert_eq!(out, b"abcdef");
    }

    #[test]
    fn test_rehandshake_is_fatal() {
        let mut channel = MockChannel::default();
        channel.recv_script.push_back(RecvStep::Data(b"abc".to_vec()));
        channel.recv_script.push_back(RecvStep::Fail(RecordError::Rehandshake));
        channel.recv_script.push_back(RecvStep::Data(b"never".to_vec()));

        let mut out = Vec::new();
        let err = receive_key(&mut channel, &mut out, CHUNK_SIZE).unwrap_err();
        assert!(matches!(err, TransferError::ChannelRead(RecordError::Rehandshake)));
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_premature_termination_is_fatal() {
        let mut channel = MockChannel::default();
        channel
            .recv_script
            .push_back(RecvStep::Fail(RecordError::PrematureTermination));

        let err = receive_key(&mut channel, &mut Vec::<u8>::new(), CHUNK_SIZE).unwrap_err();
        assert!(matches!(
            err,
            TransferError::ChannelRead(RecordError::PrematureTermination)
        ));
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space left"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_output_write_failure_is_fatal() {
        let mut channel = MockChannel::default();
        channel.recv_script.push_back(RecvStep::Data(b"key".to_vec()));

        let err = receive_key(&mut channel, &mut FullDisk, CHUNK_SIZE).unwrap_err();
        assert!(matches!(err, TransferError::OutputWrite { size: 3, .. }));
    }
}
