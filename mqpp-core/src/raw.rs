//! Byte-level view over a single encoded control packet.
//!
//! [`RawPacket`] is shared by every packet variant: variants hold one and keep
//! the offsets of their fields, so the same primitives locate fields when
//! decoding and write them when building. [`PacketWriter`] is the fill pass of
//! the measure/fill encoding discipline.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    codec::{Encoder, VariableByteInteger},
    error::Error,
};

/// The decoded fixed header of a packet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FixedHeader {
    pub packet_type: u8,
    pub flags: u8,
    pub remaining_length: usize,
    /// Bytes taken by the type byte and the Remaining Length field, which is
    /// also the offset of the variable header.
    pub header_len: usize,
}

impl FixedHeader {
    /// Parses the fixed header at the start of `data`.
    ///
    /// A Remaining Length that runs off the end of the buffer is a protocol
    /// violation here: callers hand this function a span that is supposed to
    /// hold a whole packet.
    pub fn parse(data: &[u8]) -> crate::Result<Self> {
        let first = *data
            .first()
            .ok_or(Error::ProtocolViolation("empty packet"))?;

        let (remaining_length, len) = match VariableByteInteger::decode_at(data, 1) {
            Ok(v) => v,
            Err(Error::NeedMoreData) => {
                return Err(Error::ProtocolViolation("truncated remaining length"))
            }
            Err(e) => return Err(e),
        };

        Ok(FixedHeader {
            packet_type: first >> 4,
            flags: first & 0b0000_1111,
            remaining_length: remaining_length.value() as usize,
            header_len: 1 + len,
        })
    }

    pub fn packet_len(&self) -> usize {
        self.header_len + self.remaining_length
    }
}

/// An immutable, exactly-sized encoded packet.
///
/// Cloning is cheap: the bytes are reference counted and never mutated.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RawPacket(Bytes);

impl RawPacket {
    /// Validates the fixed header of `data` and keeps exactly one packet.
    ///
    /// Bytes past the declared packet length are dropped from the view.
    pub fn from_bytes(data: Bytes) -> crate::Result<(Self, FixedHeader)> {
        let header = FixedHeader::parse(&data)?;

        if data.len() < header.packet_len() {
            return Err(Error::ProtocolViolation(
                "remaining length exceeds available bytes",
            ));
        }

        Ok((RawPacket(data.slice(..header.packet_len())), header))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// A packet whose remaining length is 0, such as PINGREQ.
    pub fn header_only(first_byte: u8) -> Self {
        RawPacket(Bytes::copy_from_slice(&[first_byte, 0x00]))
    }

    /// A packet whose remaining length is 2, such as PUBACK or CONNACK.
    pub fn two_byte_body(first_byte: u8, body: [u8; 2]) -> Self {
        RawPacket(Bytes::copy_from_slice(&[first_byte, 0x02, body[0], body[1]]))
    }

    pub fn to_bytes(&self) -> Bytes {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn byte(&self, offset: usize) -> crate::Result<(u8, usize)> {
        match self.0.get(offset) {
            Some(b) => Ok((*b, offset + 1)),
            None => Err(Error::ProtocolViolation("field exceeds packet length")),
        }
    }

    /// Reads a big-endian `u16`.
    pub fn uint16(&self, offset: usize) -> crate::Result<(u16, usize)> {
        match self.0.get(offset..offset + 2) {
            Some(b) => Ok((u16::from_be_bytes([b[0], b[1]]), offset + 2)),
            None => Err(Error::ProtocolViolation("field exceeds packet length")),
        }
    }

    pub fn bit(&self, offset: usize, pos: u8) -> crate::Result<bool> {
        debug_assert!(pos < 8);
        let (b, _) = self.byte(offset)?;
        Ok(b & (1 << pos) != 0)
    }

    /// Reads a length-prefixed binary field.
    pub fn binary(&self, offset: usize) -> crate::Result<(&[u8], usize)> {
        let (len, start) = self.uint16(offset)?;
        let end = start + len as usize;

        match self.0.get(start..end) {
            Some(b) => Ok((b, end)),
            None => Err(Error::ProtocolViolation("field exceeds packet length")),
        }
    }

    /// Reads a length-prefixed UTF-8 string. U+0000 is rejected.
    pub fn string(&self, offset: usize) -> crate::Result<(&str, usize)> {
        let (b, next) = self.binary(offset)?;
        let s = std::str::from_utf8(b).map_err(|_| Error::ProtocolViolation("invalid UTF-8"))?;

        if s.contains('\0') {
            return Err(Error::ProtocolViolation("string contains U+0000"));
        }

        Ok((s, next))
    }

    /// Everything from `offset` to the end of the packet.
    pub fn tail(&self, offset: usize) -> &[u8] {
        self.0.get(offset..).unwrap_or(&[])
    }

    /// Same as [`tail`](Self::tail) but sharing the underlying buffer.
    pub fn tail_bytes(&self, offset: usize) -> Bytes {
        if offset >= self.0.len() {
            return Bytes::new();
        }

        self.0.slice(offset..)
    }

    // Accessors used after decode. Offsets have already been validated, so a
    // miss can only come from a bug and yields the default value.

    pub fn u8_at(&self, offset: usize) -> u8 {
        self.byte(offset).map(|(v, _)| v).unwrap_or_default()
    }

    pub fn u16_at(&self, offset: usize) -> u16 {
        self.uint16(offset).map(|(v, _)| v).unwrap_or_default()
    }

    pub fn bit_at(&self, offset: usize, pos: u8) -> bool {
        self.bit(offset, pos).unwrap_or_default()
    }

    /// The string at a validated offset. Locating it is O(1), but the UTF-8
    /// check is repeated on every call (O(len)); the U+0000 scan is not.
    pub fn str_at(&self, offset: usize) -> &str {
        std::str::from_utf8(self.binary_at(offset)).unwrap_or_default()
    }

    pub fn binary_at(&self, offset: usize) -> &[u8] {
        self.binary(offset).map(|(v, _)| v).unwrap_or_default()
    }
}

impl AsRef<[u8]> for RawPacket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RawPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawPacket({:02x?})", &self.0[..])
    }
}

/// Writes the fields of a packet into a buffer allocated at its final size.
pub struct PacketWriter {
    buffer: BytesMut,
    packet_len: usize,
}

impl PacketWriter {
    /// Starts a packet whose variable header and payload measure
    /// `remaining_length` bytes. Writes the fixed header.
    pub fn new(first_byte: u8, remaining_length: usize) -> crate::Result<Self> {
        let remaining_len = VariableByteInteger::new(remaining_length)?;
        let packet_len = 1 + remaining_len.encoded_size() + remaining_length;

        let mut buffer = BytesMut::with_capacity(packet_len);
        buffer.put_u8(first_byte);
        remaining_len.encode(&mut buffer);

        Ok(PacketWriter { buffer, packet_len })
    }

    /// Offset the next field will be written at.
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    /// Validates and appends a field, returning the offset following it.
    pub fn put<E>(&mut self, field: &E) -> crate::Result<usize>
    where
        E: Encoder + ?Sized,
    {
        field.validate()?;
        field.encode(&mut self.buffer);
        Ok(self.buffer.len())
    }

    /// Sets or clears bit `pos` of an already written byte.
    pub fn set_bit(&mut self, offset: usize, pos: u8, value: bool) -> &mut Self {
        debug_assert!(pos < 8);

        if let Some(b) = self.buffer.get_mut(offset) {
            if value {
                *b |= 1 << pos;
            } else {
                *b &= !(1 << pos);
            }
        }

        self
    }

    /// Fails unless the written fields add up to the remaining length the
    /// writer was created with.
    pub fn finish(self) -> crate::Result<RawPacket> {
        if self.buffer.len() != self.packet_len {
            return Err(Error::ProtocolViolation(
                "written length does not match remaining length",
            ));
        }

        Ok(RawPacket(self.buffer.freeze()))
    }
}
