use bytes::Bytes;

use mqpp_core::{raw::RawPacket, Result};

use crate::{header, PacketType};

/// PUBACK, the response to a QoS 1 PUBLISH.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Puback {
    raw: RawPacket,
}

impl Puback {
    pub fn new(packet_id: u16) -> Self {
        Puback {
            raw: header::encode_packet_id_only(PacketType::Puback, packet_id),
        }
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let raw = header::decode_packet_id_only(data, PacketType::Puback)?;
        Ok(Puback { raw })
    }

    pub fn packet_identifier(&self) -> u16 {
        self.raw.u16_at(header::PACKET_ID_POS)
    }
}

impl_packet!(Puback, Puback);
