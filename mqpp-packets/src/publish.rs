use bytes::Bytes;

use mqpp_core::{
    codec::Encoder,
    error::Error,
    qos::QoS,
    raw::{PacketWriter, RawPacket},
    Result,
};

use crate::{header, PacketType};

const DUP_BIT: u8 = 3;
const RETAIN_BIT: u8 = 0;

fn qos_from_flags(flags: u8) -> Result<QoS> {
    QoS::try_from((flags >> 1) & 0b0000_0011)
}

/// PUBLISH, an application message.
///
/// Variable header: topic name, then a packet identifier when QoS > 0. The
/// payload is not length-prefixed and runs to the end of the packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Publish {
    raw: RawPacket,
    topic_name_pos: usize,
    packet_id_pos: Option<usize>,
    payload_pos: usize,
}

impl Publish {
    pub fn new(
        dup: bool,
        qos: QoS,
        retain: bool,
        topic_name: &str,
        packet_id: u16,
        payload: &[u8],
    ) -> Result<Self> {
        if dup && qos == QoS::AtMostOnce {
            return Err(Error::ProtocolViolation("dup set on QoS 0 publish"));
        }

        let mut remaining_len = 0;

        remaining_len += topic_name.encoded_size();
        if qos > QoS::AtMostOnce {
            remaining_len += packet_id.encoded_size();
        }
        remaining_len += payload.encoded_size();

        let first_byte = PacketType::Publish.first_byte() | ((qos as u8) << 1);
        let mut writer = PacketWriter::new(first_byte, remaining_len)?;
        writer
            .set_bit(0, DUP_BIT, dup)
            .set_bit(0, RETAIN_BIT, retain);

        let topic_name_pos = writer.offset();
        let mut offset = writer.put(topic_name)?;

        let mut packet_id_pos = None;
        if qos > QoS::AtMostOnce {
            packet_id_pos = Some(offset);
            offset = writer.put(&packet_id)?;
        }

        let payload_pos = offset;
        writer.put(payload)?;

        Ok(Publish {
            raw: writer.finish()?,
            topic_name_pos,
            packet_id_pos,
            payload_pos,
        })
    }

    /// Decodes a PUBLISH. QoS 3 is rejected, and so is DUP set on a QoS 0
    /// message, which some implementations tolerate.
    pub fn decode(data: Bytes) -> Result<Self> {
        let (raw, header) = header::decode_fixed_header(data, PacketType::Publish)?;

        let qos = qos_from_flags(header.flags)?;
        if qos == QoS::AtMostOnce && (header.flags & (1 << DUP_BIT)) != 0 {
            return Err(Error::ProtocolViolation("dup set on QoS 0 publish"));
        }

        let topic_name_pos = header.header_len;
        let (_, mut offset) = raw.string(topic_name_pos)?;

        let mut packet_id_pos = None;
        if qos > QoS::AtMostOnce {
            packet_id_pos = Some(offset);
            let (_, next) = raw.uint16(offset)?;
            offset = next;
        }

        Ok(Publish {
            raw,
            topic_name_pos,
            packet_id_pos,
            payload_pos: offset,
        })
    }

    pub fn dup(&self) -> bool {
        self.raw.bit_at(0, DUP_BIT)
    }

    pub fn qos(&self) -> QoS {
        qos_from_flags(self.raw.u8_at(0)).unwrap_or_default()
    }

    pub fn retain(&self) -> bool {
        self.raw.bit_at(0, RETAIN_BIT)
    }

    pub fn topic_name(&self) -> &str {
        self.raw.str_at(self.topic_name_pos)
    }

    /// The packet identifier, or 0 for QoS 0 messages which carry none.
    pub fn packet_identifier(&self) -> u16 {
        match self.packet_id_pos {
            Some(pos) => self.raw.u16_at(pos),
            None => 0,
        }
    }

    pub fn payload(&self) -> &[u8] {
        self.raw.tail(self.payload_pos)
    }

    /// The payload sharing the packet's buffer.
    pub fn payload_bytes(&self) -> Bytes {
        self.raw.tail_bytes(self.payload_pos)
    }
}

impl_packet!(Publish, Publish);
