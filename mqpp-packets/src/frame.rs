//! Cuts complete packet spans out of a byte stream.
//!
//! The framer only looks at the fixed header: it never validates the
//! packet it returns, so every span must still go through
//! [`ControlPacket::decode`](crate::ControlPacket::decode).

use bytes::{Bytes, BytesMut};

use mqpp_core::{codec::VariableByteInteger, error::Error, Result};

/// Outcome of a successful framing step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    /// The buffer does not yet hold a complete packet.
    NeedMoreData,
    /// The first complete packet in the buffer.
    Packet(&'a [u8]),
}

impl Frame<'_> {
    /// Bytes the caller should drop from the front of its buffer.
    pub fn consumed(&self) -> usize {
        match self {
            Frame::NeedMoreData => 0,
            Frame::Packet(packet) => packet.len(),
        }
    }
}

/// Looks for the first complete packet in `buffer`.
///
/// When `at_eof` is set no more bytes will arrive, so a partial packet
/// becomes [`Error::IncompletePacket`] instead of [`Frame::NeedMoreData`].
/// An empty buffer is never an error.
pub fn next_packet(buffer: &[u8], at_eof: bool) -> Result<Frame<'_>> {
    if buffer.is_empty() {
        return Ok(Frame::NeedMoreData);
    }

    let (remaining_length, len) = match VariableByteInteger::decode_at(buffer, 1) {
        Ok(decoded) => decoded,
        Err(Error::NeedMoreData) if at_eof => return Err(Error::IncompletePacket),
        Err(Error::NeedMoreData) => return Ok(Frame::NeedMoreData),
        Err(e) => return Err(e),
    };

    let packet_len = 1 + len + remaining_length.value() as usize;

    match buffer.get(..packet_len) {
        Some(packet) => Ok(Frame::Packet(packet)),
        None if at_eof => Err(Error::IncompletePacket),
        None => Ok(Frame::NeedMoreData),
    }
}

/// Splits the first complete packet off the front of `buffer`.
///
/// Returns `Ok(None)` while more bytes are needed. The returned bytes share
/// the buffer's allocation.
pub fn split_packet(buffer: &mut BytesMut, at_eof: bool) -> Result<Option<Bytes>> {
    let consumed = match next_packet(buffer, at_eof)? {
        Frame::NeedMoreData => return Ok(None),
        frame => frame.consumed(),
    };

    Ok(Some(buffer.split_to(consumed).freeze()))
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use mqpp_core::error::Error;

    use crate::frame::*;

    #[test]
    fn test_next_packet_consecutive() -> mqpp_core::Result<()> {
        let buffer = [0xc0, 0x00, 0xd0, 0x00];

        let frame = next_packet(&buffer, false)?;
        assert_eq!(frame, Frame::Packet(&[0xc0, 0x00]));
        assert_eq!(frame.consumed(), 2);

        let frame = next_packet(&buffer[frame.consumed()..], false)?;
        assert_eq!(frame, Frame::Packet(&[0xd0, 0x00]));
        assert_eq!(frame.consumed(), 2);

        Ok(())
    }

    #[test]
    fn test_next_packet_empty_buffer() -> mqpp_core::Result<()> {
        assert_eq!(next_packet(&[], false)?, Frame::NeedMoreData);
        assert_eq!(next_packet(&[], true)?, Frame::NeedMoreData);

        Ok(())
    }

    #[test]
    fn test_next_packet_truncated_payload() -> mqpp_core::Result<()> {
        let buffer = [0x31, 0x0a, 0x00];

        assert_eq!(next_packet(&buffer, false)?, Frame::NeedMoreData);

        match next_packet(&buffer, true) {
            Err(Error::IncompletePacket) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_next_packet_truncated_remaining_length() -> mqpp_core::Result<()> {
        for buffer in [&[0x30][..], &[0x30, 0x80][..], &[0x30, 0xff, 0xff, 0xff][..]] {
            assert_eq!(next_packet(buffer, false)?, Frame::NeedMoreData);

            match next_packet(buffer, true) {
                Err(Error::IncompletePacket) => {}
                other => panic!("unexpected result for {:?}: {:?}", buffer, other),
            }
        }

        Ok(())
    }

    #[test]
    fn test_next_packet_malformed_remaining_length() {
        let buffer = [0x30, 0xff, 0xff, 0xff, 0xff, 0x7f];

        for at_eof in [false, true] {
            match next_packet(&buffer, at_eof) {
                Err(Error::MalformedRemLen { scanned }) => assert_eq!(scanned, 4),
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn test_next_packet_ignores_following_bytes() -> mqpp_core::Result<()> {
        // a Puback followed by the first byte of another packet
        let buffer = [0x40, 0x02, 0x00, 0x01, 0x30];

        assert_eq!(
            next_packet(&buffer, true)?,
            Frame::Packet(&[0x40, 0x02, 0x00, 0x01])
        );

        Ok(())
    }

    #[test]
    fn test_next_packet_multi_byte_remaining_length() -> mqpp_core::Result<()> {
        let mut buffer = vec![0x30, 0x80, 0x01];
        buffer.resize(3 + 128, 0);

        assert_eq!(next_packet(&buffer[..100], false)?, Frame::NeedMoreData);
        assert_eq!(next_packet(&buffer, false)?.consumed(), 131);

        Ok(())
    }

    #[test]
    fn test_split_packet() -> mqpp_core::Result<()> {
        let mut buffer = BytesMut::from(&[0xc0u8, 0x00, 0xe0][..]);

        let packet = split_packet(&mut buffer, false)?;
        assert_eq!(packet.as_deref(), Some(&[0xc0, 0x00][..]));
        assert_eq!(&buffer[..], &[0xe0]);

        assert_eq!(split_packet(&mut buffer, false)?, None);
        assert_eq!(&buffer[..], &[0xe0]);

        buffer.extend_from_slice(&[0x00]);
        let packet = split_packet(&mut buffer, false)?;
        assert_eq!(packet.as_deref(), Some(&[0xe0, 0x00][..]));
        assert!(buffer.is_empty());

        Ok(())
    }
}
