use bytes::Bytes;

use mqpp_core::{raw::RawPacket, Result};

use crate::{header, PacketType};

/// PUBCOMP, the last packet of the QoS 2 exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pubcomp {
    raw: RawPacket,
}

impl Pubcomp {
    pub fn new(packet_id: u16) -> Self {
        Pubcomp {
            raw: header::encode_packet_id_only(PacketType::Pubcomp, packet_id),
        }
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let raw = header::decode_packet_id_only(data, PacketType::Pubcomp)?;
        Ok(Pubcomp { raw })
    }

    pub fn packet_identifier(&self) -> u16 {
        self.raw.u16_at(header::PACKET_ID_POS)
    }
}

impl_packet!(Pubcomp, Pubcomp);
