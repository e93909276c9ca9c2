use std::mem;

use bytes::{BufMut, BytesMut};

use crate::error::Error;

/// Largest value a Remaining Length field can carry.
pub const MAX_REMAINING_LENGTH: usize = 268_435_455;

/// Largest payload of a length-prefixed string or binary field.
pub const MAX_FIELD_LENGTH: usize = u16::MAX as usize;

const MAX_VAR_BYTES: usize = 4;

/// A field that can be measured and then written into a packet buffer.
///
/// Builders call `encoded_size` on every field first so the output buffer is
/// allocated once at its final size, then call `encode` in wire order.
/// `validate` is checked before a field is written; `encode` assumes it
/// passed.
pub trait Encoder {
    fn encode(&self, buffer: &mut BytesMut);
    fn encoded_size(&self) -> usize {
        mem::size_of_val(self)
    }
    fn validate(&self) -> crate::Result<()> {
        Ok(())
    }
}

/// Rejects strings and binaries that do not fit a 2-byte length prefix.
pub fn check_field_length(len: usize) -> crate::Result<()> {
    if len > MAX_FIELD_LENGTH {
        return Err(Error::FieldTooLong(len));
    }

    Ok(())
}

/// Rejects strings a decoder would refuse: over-long or containing U+0000.
pub fn check_string(s: &str) -> crate::Result<()> {
    check_field_length(s.len())?;

    if s.contains('\0') {
        return Err(Error::ProtocolViolation("string contains U+0000"));
    }

    Ok(())
}

fn encode_var_byte_integer(value: u32, encoded: &mut BytesMut) {
    let mut x = value;

    loop {
        let mut encoded_byte: u8 = (x % 128) as u8;
        x /= 128;

        if x > 0 {
            encoded_byte |= 0b1000_0000;
        }

        encoded.put_u8(encoded_byte);

        if x == 0 {
            break;
        }
    }
}

/// The Remaining Length variable byte integer.
///
/// Only values up to [`MAX_REMAINING_LENGTH`] can be constructed, so every
/// instance encodes to 1-4 bytes.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct VariableByteInteger(u32);

impl VariableByteInteger {
    pub fn new(value: usize) -> crate::Result<Self> {
        if value > MAX_REMAINING_LENGTH {
            return Err(Error::PacketTooLarge(value));
        }

        Ok(VariableByteInteger(value as u32))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Decodes the integer starting at `offset`, returning the value and the
    /// number of bytes it occupied.
    ///
    /// Fails with `NeedMoreData` when the buffer ends before the terminating
    /// byte, and with `MalformedRemLen` when the fourth byte still carries the
    /// continuation bit.
    pub fn decode_at(buffer: &[u8], offset: usize) -> crate::Result<(Self, usize)> {
        let encoded = buffer.get(offset..).unwrap_or(&[]);
        let mut value: u32 = 0;
        let mut shift = 0;

        for (i, encoded_byte) in encoded.iter().take(MAX_VAR_BYTES).enumerate() {
            value |= ((encoded_byte & 0b0111_1111) as u32) << shift;

            if (encoded_byte & 0b1000_0000) == 0 {
                return Ok((VariableByteInteger(value), i + 1));
            }

            shift += 7;
        }

        if encoded.len() >= MAX_VAR_BYTES {
            return Err(Error::MalformedRemLen {
                scanned: MAX_VAR_BYTES,
            });
        }

        Err(Error::NeedMoreData)
    }
}

impl From<u8> for VariableByteInteger {
    fn from(value: u8) -> Self {
        VariableByteInteger(value as u32)
    }
}

impl Encoder for VariableByteInteger {
    fn encode(&self, buffer: &mut BytesMut) {
        encode_var_byte_integer(self.0, buffer);
    }

    fn encoded_size(&self) -> usize {
        match self.0 {
            0..=127 => 1,
            128..=16383 => 2,
            16384..=2097151 => 3,
            _ => 4,
        }
    }
}

/// Length-prefixed UTF-8 string.
impl Encoder for str {
    fn encode(&self, buffer: &mut BytesMut) {
        buffer.put_u16(self.len() as u16);
        buffer.put(self.as_bytes());
    }

    fn encoded_size(&self) -> usize {
        self.len() + mem::size_of::<u16>()
    }

    fn validate(&self) -> crate::Result<()> {
        check_string(self)
    }
}

impl Encoder for String {
    fn encode(&self, buffer: &mut BytesMut) {
        self.as_str().encode(buffer);
    }

    fn encoded_size(&self) -> usize {
        self.as_str().encoded_size()
    }

    fn validate(&self) -> crate::Result<()> {
        check_string(self)
    }
}

/// Raw bytes, written as-is with no length prefix.
impl Encoder for [u8] {
    fn encode(&self, buffer: &mut BytesMut) {
        buffer.put(self);
    }

    fn encoded_size(&self) -> usize {
        self.len()
    }
}

/// Binary data preceded by a 2-byte big-endian length.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LengthPrefixed<'a>(pub &'a [u8]);

impl Encoder for LengthPrefixed<'_> {
    fn encode(&self, buffer: &mut BytesMut) {
        buffer.put_u16(self.0.len() as u16);
        buffer.put(self.0);
    }

    fn encoded_size(&self) -> usize {
        mem::size_of::<u16>() + self.0.len()
    }

    fn validate(&self) -> crate::Result<()> {
        check_field_length(self.0.len())
    }
}

impl Encoder for u8 {
    fn encode(&self, buffer: &mut BytesMut) {
        buffer.put_u8(*self);
    }
}

impl Encoder for u16 {
    fn encode(&self, buffer: &mut BytesMut) {
        buffer.put_u16(*self);
    }
}

impl<T> Encoder for &T
where
    T: Encoder + ?Sized,
{
    fn encode(&self, buffer: &mut BytesMut) {
        (**self).encode(buffer);
    }

    fn encoded_size(&self) -> usize {
        (**self).encoded_size()
    }

    fn validate(&self) -> crate::Result<()> {
        (**self).validate()
    }
}

impl<T> Encoder for Option<T>
where
    T: Encoder,
{
    fn encode(&self, buffer: &mut BytesMut) {
        if let Some(v) = self {
            v.encode(buffer);
        }
    }

    fn encoded_size(&self) -> usize {
        match self {
            Some(v) => v.encoded_size(),
            None => 0,
        }
    }

    fn validate(&self) -> crate::Result<()> {
        match self {
            Some(v) => v.validate(),
            None => Ok(()),
        }
    }
}
