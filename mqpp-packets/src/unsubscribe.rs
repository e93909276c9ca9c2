use bytes::Bytes;

use mqpp_core::{
    codec::Encoder,
    error::Error,
    raw::{PacketWriter, RawPacket},
    Result,
};

use crate::{header, PacketType};

/// UNSUBSCRIBE, a request to drop one or more topic filters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unsubscribe {
    raw: RawPacket,
    packet_id_pos: usize,
    topic_filter_positions: Vec<usize>,
}

impl Unsubscribe {
    pub fn new(packet_id: u16, topic_filters: &[&str]) -> Result<Self> {
        if topic_filters.is_empty() {
            return Err(Error::ProtocolViolation("unsubscribe without topic filters"));
        }

        let mut remaining_len = packet_id.encoded_size();
        for topic_filter in topic_filters {
            remaining_len += topic_filter.encoded_size();
        }

        let mut writer = PacketWriter::new(PacketType::Unsubscribe.first_byte(), remaining_len)?;
        let packet_id_pos = writer.offset();
        let mut offset = writer.put(&packet_id)?;

        let mut topic_filter_positions = Vec::with_capacity(topic_filters.len());
        for topic_filter in topic_filters {
            topic_filter_positions.push(offset);
            offset = writer.put(*topic_filter)?;
        }

        Ok(Unsubscribe {
            raw: writer.finish()?,
            packet_id_pos,
            topic_filter_positions,
        })
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let (raw, header) = header::decode_fixed_header(data, PacketType::Unsubscribe)?;

        let packet_id_pos = header.header_len;
        let (_, mut offset) = raw.uint16(packet_id_pos)?;

        let mut topic_filter_positions = Vec::new();
        while offset < header.packet_len() {
            topic_filter_positions.push(offset);
            let (_, next) = raw.string(offset)?;
            offset = next;
        }

        if topic_filter_positions.is_empty() {
            return Err(Error::ProtocolViolation("unsubscribe without topic filters"));
        }

        header::expect_end(offset, &header)?;

        Ok(Unsubscribe {
            raw,
            packet_id_pos,
            topic_filter_positions,
        })
    }

    pub fn packet_identifier(&self) -> u16 {
        self.raw.u16_at(self.packet_id_pos)
    }

    pub fn topic_filters(&self) -> impl Iterator<Item = &str> + '_ {
        self.topic_filter_positions
            .iter()
            .map(move |&pos| self.raw.str_at(pos))
    }
}

impl_packet!(Unsubscribe, Unsubscribe);
