use bytes::Bytes;

use mqpp_core::{raw::RawPacket, Result};

use crate::{header, PacketType};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pingresp {
    raw: RawPacket,
}

impl Pingresp {
    pub fn new() -> Self {
        Pingresp {
            raw: header::encode_empty(PacketType::Pingresp),
        }
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let raw = header::decode_empty(data, PacketType::Pingresp)?;
        Ok(Pingresp { raw })
    }
}

impl Default for Pingresp {
    fn default() -> Self {
        Self::new()
    }
}

impl_packet!(Pingresp, Pingresp);
