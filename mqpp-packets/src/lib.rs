//! MQTT 3.1.1 control packets.
//!
//! Every packet type is a thin value over its encoded bytes. Packets are
//! created either by decoding a framed byte span or through the per-type
//! constructors, and are immutable afterwards. [`ControlPacket`] dispatches a
//! span to the right decoder, and [`frame::next_packet`] cuts spans out of a
//! byte stream.
//!
//! Accessors read fields at offsets recorded during decode. String accessors
//! still re-check UTF-8 on each call, so hold on to the `&str` when reading it
//! repeatedly.

use std::fmt;

use bytes::{Bytes, BytesMut};

use mqpp_core::{codec::Encoder, error::Error, Result};

/// Implements the shared packet capability for a variant holding a `raw`
/// field, and wraps it into [`ControlPacket`].
macro_rules! impl_packet {
    ($packet:ident, $variant:ident) => {
        impl $crate::Packet for $packet {
            fn packet_type(&self) -> $crate::PacketType {
                $crate::PacketType::$variant
            }

            fn as_bytes(&self) -> &[u8] {
                self.raw.as_bytes()
            }

            fn to_bytes(&self) -> ::bytes::Bytes {
                self.raw.to_bytes()
            }
        }

        impl ::mqpp_core::codec::Encoder for $packet {
            fn encode(&self, buffer: &mut ::bytes::BytesMut) {
                buffer.extend_from_slice(self.raw.as_bytes());
            }

            fn encoded_size(&self) -> usize {
                self.raw.len()
            }
        }

        impl From<$packet> for $crate::ControlPacket {
            fn from(packet: $packet) -> Self {
                $crate::ControlPacket::$variant(packet)
            }
        }
    };
}

mod header;

#[cfg(feature = "codec")]
pub mod codec;
pub mod connack;
pub mod connect;
pub mod disconnect;
pub mod frame;
pub mod pingreq;
pub mod pingresp;
pub mod puback;
pub mod pubcomp;
pub mod publish;
pub mod pubrec;
pub mod pubrel;
pub mod suback;
pub mod subscribe;
pub mod unsuback;
pub mod unsubscribe;

use crate::{
    connack::Connack, connect::Connect, disconnect::Disconnect, pingreq::Pingreq,
    pingresp::Pingresp, puback::Puback, pubcomp::Pubcomp, publish::Publish, pubrec::Pubrec,
    pubrel::Pubrel, suback::Suback, subscribe::Subscribe, unsuback::Unsuback,
    unsubscribe::Unsubscribe,
};

/// The 4-bit control packet type carried in the first byte.
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum PacketType {
    Connect = 0x01,
    Connack,
    Publish,
    Puback,
    Pubrec,
    Pubrel,
    Pubcomp,
    Subscribe,
    Suback,
    Unsubscribe,
    Unsuback,
    Pingreq,
    Pingresp,
    Disconnect,
}

impl PacketType {
    /// The value the low nibble of the first byte must hold, or `None` for
    /// PUBLISH whose flags carry DUP, QoS and RETAIN.
    pub fn fixed_flags(&self) -> Option<u8> {
        match self {
            PacketType::Publish => None,
            PacketType::Pubrel | PacketType::Subscribe | PacketType::Unsubscribe => {
                Some(0b0010)
            }
            _ => Some(0b0000),
        }
    }

    /// First byte of a packet of this type. For PUBLISH the flags are left
    /// clear.
    pub fn first_byte(&self) -> u8 {
        ((*self as u8) << 4) | self.fixed_flags().unwrap_or(0)
    }
}

impl TryFrom<u8> for PacketType {
    type Error = Error;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        use PacketType::*;

        let res = match value {
            0x01 => Connect,
            0x02 => Connack,
            0x03 => Publish,
            0x04 => Puback,
            0x05 => Pubrec,
            0x06 => Pubrel,
            0x07 => Pubcomp,
            0x08 => Subscribe,
            0x09 => Suback,
            0x0a => Unsubscribe,
            0x0b => Unsuback,
            0x0c => Pingreq,
            0x0d => Pingresp,
            0x0e => Disconnect,
            _ => return Err(Error::ReservedPacketType(value)),
        };

        Ok(res)
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PacketType::Connect => "CONNECT",
            PacketType::Connack => "CONNACK",
            PacketType::Publish => "PUBLISH",
            PacketType::Puback => "PUBACK",
            PacketType::Pubrec => "PUBREC",
            PacketType::Pubrel => "PUBREL",
            PacketType::Pubcomp => "PUBCOMP",
            PacketType::Subscribe => "SUBSCRIBE",
            PacketType::Suback => "SUBACK",
            PacketType::Unsubscribe => "UNSUBSCRIBE",
            PacketType::Unsuback => "UNSUBACK",
            PacketType::Pingreq => "PINGREQ",
            PacketType::Pingresp => "PINGRESP",
            PacketType::Disconnect => "DISCONNECT",
        };

        f.write_str(name)
    }
}

/// Capability shared by every packet type.
pub trait Packet {
    fn packet_type(&self) -> PacketType;

    /// The complete encoded packet, fixed header included.
    fn as_bytes(&self) -> &[u8];

    /// The encoded packet as a reference-counted buffer.
    fn to_bytes(&self) -> Bytes;

    fn length(&self) -> usize {
        self.as_bytes().len()
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ControlPacket {
    Connect(Connect),
    Connack(Connack),
    Publish(Publish),
    Puback(Puback),
    Pubrec(Pubrec),
    Pubrel(Pubrel),
    Pubcomp(Pubcomp),
    Subscribe(Subscribe),
    Suback(Suback),
    Unsubscribe(Unsubscribe),
    Unsuback(Unsuback),
    Pingreq(Pingreq),
    Pingresp(Pingresp),
    Disconnect(Disconnect),
}

impl ControlPacket {
    /// Decodes one packet from a span holding it, dispatching on the type
    /// nibble. The span normally comes from [`frame::next_packet`], but any
    /// buffer is accepted: every decoder re-validates lengths and flags.
    pub fn decode(src: Bytes) -> Result<ControlPacket> {
        use ControlPacket::*;

        let first = *src
            .first()
            .ok_or(Error::ProtocolViolation("empty packet"))?;

        let packet = match PacketType::try_from(first >> 4)? {
            PacketType::Connect => Connect(connect::Connect::decode(src)?),
            PacketType::Connack => Connack(connack::Connack::decode(src)?),
            PacketType::Publish => Publish(publish::Publish::decode(src)?),
            PacketType::Puback => Puback(puback::Puback::decode(src)?),
            PacketType::Pubrec => Pubrec(pubrec::Pubrec::decode(src)?),
            PacketType::Pubrel => Pubrel(pubrel::Pubrel::decode(src)?),
            PacketType::Pubcomp => Pubcomp(pubcomp::Pubcomp::decode(src)?),
            PacketType::Subscribe => Subscribe(subscribe::Subscribe::decode(src)?),
            PacketType::Suback => Suback(suback::Suback::decode(src)?),
            PacketType::Unsubscribe => Unsubscribe(unsubscribe::Unsubscribe::decode(src)?),
            PacketType::Unsuback => Unsuback(unsuback::Unsuback::decode(src)?),
            PacketType::Pingreq => Pingreq(pingreq::Pingreq::decode(src)?),
            PacketType::Pingresp => Pingresp(pingresp::Pingresp::decode(src)?),
            PacketType::Disconnect => Disconnect(disconnect::Disconnect::decode(src)?),
        };

        Ok(packet)
    }

    /// Copies `src` and decodes it.
    pub fn from_slice(src: &[u8]) -> Result<ControlPacket> {
        Self::decode(Bytes::copy_from_slice(src))
    }

    fn as_packet(&self) -> &dyn Packet {
        use ControlPacket::*;

        match self {
            Connect(p) => p,
            Connack(p) => p,
            Publish(p) => p,
            Puback(p) => p,
            Pubrec(p) => p,
            Pubrel(p) => p,
            Pubcomp(p) => p,
            Subscribe(p) => p,
            Suback(p) => p,
            Unsubscribe(p) => p,
            Unsuback(p) => p,
            Pingreq(p) => p,
            Pingresp(p) => p,
            Disconnect(p) => p,
        }
    }
}

impl Packet for ControlPacket {
    fn packet_type(&self) -> PacketType {
        self.as_packet().packet_type()
    }

    fn as_bytes(&self) -> &[u8] {
        self.as_packet().as_bytes()
    }

    fn to_bytes(&self) -> Bytes {
        self.as_packet().to_bytes()
    }
}

impl Encoder for ControlPacket {
    fn encode(&self, buffer: &mut BytesMut) {
        buffer.extend_from_slice(self.as_bytes());
    }

    fn encoded_size(&self) -> usize {
        self.length()
    }
}
