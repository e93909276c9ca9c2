use bytes::Bytes;

use mqpp_core::{raw::RawPacket, Result};

use crate::{header, PacketType};

/// PINGREQ, sent by a client to keep the connection alive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pingreq {
    raw: RawPacket,
}

impl Pingreq {
    pub fn new() -> Self {
        Pingreq {
            raw: header::encode_empty(PacketType::Pingreq),
        }
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let raw = header::decode_empty(data, PacketType::Pingreq)?;
        Ok(Pingreq { raw })
    }
}

impl Default for Pingreq {
    fn default() -> Self {
        Self::new()
    }
}

impl_packet!(Pingreq, Pingreq);

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use mqpp_core::error::Error;

    use crate::{pingreq::Pingreq, Packet};

    #[test]
    fn test_pingreq_packet_encode_decode() -> mqpp_core::Result<()> {
        let packet = Pingreq::new();
        assert_eq!(packet.as_bytes(), &[0xc0, 0x00]);

        let new_packet = Pingreq::decode(Bytes::from_static(&[0xc0, 0x00]))?;
        assert_eq!(packet, new_packet);

        Ok(())
    }

    #[test]
    fn test_pingreq_with_payload() {
        match Pingreq::decode(Bytes::from_static(&[0xc0, 0x01, 0x00])) {
            Err(Error::ProtocolViolation(reason)) => assert_eq!(reason, "remaining length must be 0"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
