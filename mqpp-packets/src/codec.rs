//! [`tokio_util::codec`] adapters over the stream framer.
//!
//! [`FrameCodec`] yields raw packet spans and leaves decoding to the caller,
//! so a bad packet can be skipped. [`PacketCodec`] yields decoded
//! [`ControlPacket`]s and ends the stream on the first error.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

use mqpp_core::error::Error;

use crate::{frame::split_packet, ControlPacket, Packet};

fn next_frame(src: &mut BytesMut, at_eof: bool) -> Result<Option<Bytes>, Error> {
    match split_packet(src, at_eof) {
        Ok(Some(frame)) => {
            trace!(len = frame.len(), buffered = src.len(), "framed packet");
            Ok(Some(frame))
        }
        Ok(None) => Ok(None),
        Err(e) => {
            debug!(buffered = src.len(), at_eof, "framing failed: {}", e);
            Err(e)
        }
    }
}

/// Splits a byte stream into undecoded packet spans.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        next_frame(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        next_frame(src, true)
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

/// Reads and writes [`ControlPacket`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct PacketCodec;

impl PacketCodec {
    fn decode_frame(frame: Option<Bytes>) -> Result<Option<ControlPacket>, Error> {
        let frame = match frame {
            Some(frame) => frame,
            None => return Ok(None),
        };

        match ControlPacket::decode(frame) {
            Ok(packet) => {
                trace!(packet_type = %packet.packet_type(), len = packet.length(), "decoded packet");
                Ok(Some(packet))
            }
            Err(e) => {
                debug!("decoding failed: {}", e);
                Err(e)
            }
        }
    }
}

impl Decoder for PacketCodec {
    type Item = ControlPacket;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Self::decode_frame(next_frame(src, false)?)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Self::decode_frame(next_frame(src, true)?)
    }
}

impl Encoder<ControlPacket> for PacketCodec {
    type Error = Error;

    fn encode(&mut self, item: ControlPacket, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(item.as_bytes());
        Ok(())
    }
}
