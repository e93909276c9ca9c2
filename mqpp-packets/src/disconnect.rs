use bytes::Bytes;

use mqpp_core::{raw::RawPacket, Result};

use crate::{header, PacketType};

/// DISCONNECT, the last packet a client sends before closing the connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disconnect {
    raw: RawPacket,
}

impl Disconnect {
    pub fn new() -> Self {
        Disconnect {
            raw: header::encode_empty(PacketType::Disconnect),
        }
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let raw = header::decode_empty(data, PacketType::Disconnect)?;
        Ok(Disconnect { raw })
    }
}

impl Default for Disconnect {
    fn default() -> Self {
        Self::new()
    }
}

impl_packet!(Disconnect, Disconnect);
