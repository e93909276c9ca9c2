use bytes::Bytes;

use mqpp_core::{raw::RawPacket, Result};

use crate::{header, PacketType};

/// PUBREL, the response to a PUBREC. Its fixed header flags are `0b0010`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pubrel {
    raw: RawPacket,
}

impl Pubrel {
    pub fn new(packet_id: u16) -> Self {
        Pubrel {
            raw: header::encode_packet_id_only(PacketType::Pubrel, packet_id),
        }
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let raw = header::decode_packet_id_only(data, PacketType::Pubrel)?;
        Ok(Pubrel { raw })
    }

    pub fn packet_identifier(&self) -> u16 {
        self.raw.u16_at(header::PACKET_ID_POS)
    }
}

impl_packet!(Pubrel, Pubrel);

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use mqpp_core::error::Error;

    use crate::{pubrel::Pubrel, Packet};

    #[test]
    fn test_pubrel_packet_encode_decode() -> mqpp_core::Result<()> {
        let packet = Pubrel::new(7);
        assert_eq!(packet.as_bytes(), &[0x62, 0x02, 0x00, 0x07]);

        let new_packet = Pubrel::decode(Bytes::from_static(&[0x62, 0x02, 0x00, 0x07]))?;
        assert_eq!(new_packet.packet_identifier(), 7);
        assert_eq!(packet, new_packet);

        Ok(())
    }

    #[test]
    fn test_pubrel_requires_reserved_flags() {
        match Pubrel::decode(Bytes::from_static(&[0x60, 0x02, 0x00, 0x07])) {
            Err(Error::ProtocolViolation(reason)) => {
                assert_eq!(reason, "invalid fixed header flags")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
