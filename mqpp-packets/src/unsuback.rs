use bytes::Bytes;

use mqpp_core::{raw::RawPacket, Result};

use crate::{header, PacketType};

/// UNSUBACK, sent by the server to confirm an UNSUBSCRIBE.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unsuback {
    raw: RawPacket,
}

impl Unsuback {
    pub fn new(packet_id: u16) -> Self {
        Unsuback {
            raw: header::encode_packet_id_only(PacketType::Unsuback, packet_id),
        }
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let raw = header::decode_packet_id_only(data, PacketType::Unsuback)?;
        Ok(Unsuback { raw })
    }

    pub fn packet_identifier(&self) -> u16 {
        self.raw.u16_at(header::PACKET_ID_POS)
    }
}

impl_packet!(Unsuback, Unsuback);
