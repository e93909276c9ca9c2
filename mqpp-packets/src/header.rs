//! Fixed header validation and the layouts shared by several packet types.

use bytes::Bytes;

use mqpp_core::{
    error::Error,
    raw::{FixedHeader, RawPacket},
    Result,
};

use crate::PacketType;

/// Offset of the packet identifier in packets whose remaining length is 2.
pub(crate) const PACKET_ID_POS: usize = 2;

/// Checks the type nibble, then the reserved flags, then that the buffer holds
/// the declared remaining length.
pub(crate) fn decode_fixed_header(
    data: Bytes,
    packet_type: PacketType,
) -> Result<(RawPacket, FixedHeader)> {
    let first = *data
        .first()
        .ok_or(Error::ProtocolViolation("empty packet"))?;

    if first >> 4 != packet_type as u8 {
        return Err(Error::ProtocolViolation("unexpected packet type"));
    }

    if let Some(flags) = packet_type.fixed_flags() {
        if first & 0b0000_1111 != flags {
            return Err(Error::ProtocolViolation("invalid fixed header flags"));
        }
    }

    RawPacket::from_bytes(data)
}

/// Fails unless the fields ended exactly at the declared packet length.
pub(crate) fn expect_end(offset: usize, header: &FixedHeader) -> Result<()> {
    if offset != header.packet_len() {
        return Err(Error::ProtocolViolation(
            "remaining length does not match content",
        ));
    }

    Ok(())
}

pub(crate) fn decode_packet_id_only(data: Bytes, packet_type: PacketType) -> Result<RawPacket> {
    let (raw, header) = decode_fixed_header(data, packet_type)?;

    if header.remaining_length != 2 {
        return Err(Error::ProtocolViolation("remaining length must be 2"));
    }

    Ok(raw)
}

pub(crate) fn encode_packet_id_only(packet_type: PacketType, packet_id: u16) -> RawPacket {
    RawPacket::two_byte_body(packet_type.first_byte(), packet_id.to_be_bytes())
}

pub(crate) fn decode_empty(data: Bytes, packet_type: PacketType) -> Result<RawPacket> {
    let (raw, header) = decode_fixed_header(data, packet_type)?;

    if header.remaining_length != 0 {
        return Err(Error::ProtocolViolation("remaining length must be 0"));
    }

    Ok(raw)
}

pub(crate) fn encode_empty(packet_type: PacketType) -> RawPacket {
    RawPacket::header_only(packet_type.first_byte())
}
