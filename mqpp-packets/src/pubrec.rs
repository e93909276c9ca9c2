use bytes::Bytes;

use mqpp_core::{raw::RawPacket, Result};

use crate::{header, PacketType};

/// PUBREC, the first response to a QoS 2 PUBLISH.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pubrec {
    raw: RawPacket,
}

impl Pubrec {
    pub fn new(packet_id: u16) -> Self {
        Pubrec {
            raw: header::encode_packet_id_only(PacketType::Pubrec, packet_id),
        }
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let raw = header::decode_packet_id_only(data, PacketType::Pubrec)?;
        Ok(Pubrec { raw })
    }

    pub fn packet_identifier(&self) -> u16 {
        self.raw.u16_at(header::PACKET_ID_POS)
    }
}

impl_packet!(Pubrec, Pubrec);
