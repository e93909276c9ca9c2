use bytes::Bytes;

use mqpp_core::{
    codec::Encoder,
    error::Error,
    qos::QoS,
    raw::{PacketWriter, RawPacket},
    Result,
};

use crate::{header, PacketType};

/// A topic filter and the maximum QoS the client wants to receive it at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Subscription<'a> {
    pub topic_filter: &'a str,
    pub requested_qos: QoS,
}

impl<'a> Subscription<'a> {
    pub fn new(topic_filter: &'a str, requested_qos: QoS) -> Self {
        Self {
            topic_filter,
            requested_qos,
        }
    }
}

/// SUBSCRIBE, a request to receive messages for one or more topic filters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscribe {
    raw: RawPacket,
    packet_id_pos: usize,
    topic_filter_positions: Vec<usize>,
}

impl Subscribe {
    pub fn new(packet_id: u16, subscriptions: &[Subscription<'_>]) -> Result<Self> {
        if subscriptions.is_empty() {
            return Err(Error::ProtocolViolation("subscribe without subscriptions"));
        }

        let mut remaining_len = packet_id.encoded_size();
        for subscription in subscriptions {
            remaining_len += subscription.topic_filter.encoded_size();
            remaining_len += 0u8.encoded_size(); // requested QoS
        }

        let mut writer = PacketWriter::new(PacketType::Subscribe.first_byte(), remaining_len)?;
        let packet_id_pos = writer.offset();
        let mut offset = writer.put(&packet_id)?;

        let mut topic_filter_positions = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            topic_filter_positions.push(offset);
            writer.put(subscription.topic_filter)?;
            offset = writer.put(&u8::from(subscription.requested_qos))?;
        }

        Ok(Subscribe {
            raw: writer.finish()?,
            packet_id_pos,
            topic_filter_positions,
        })
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let (raw, header) = header::decode_fixed_header(data, PacketType::Subscribe)?;

        let packet_id_pos = header.header_len;
        let (_, mut offset) = raw.uint16(packet_id_pos)?;

        let mut topic_filter_positions = Vec::new();
        while offset < header.packet_len() {
            topic_filter_positions.push(offset);

            let (_, qos_pos) = raw.string(offset)?;
            let (requested_qos, next) = raw.byte(qos_pos)?;

            if requested_qos & 0b1111_1100 != 0 {
                return Err(Error::ProtocolViolation(
                    "requested QoS reserved bits set",
                ));
            }
            QoS::try_from(requested_qos)?;

            offset = next;
        }

        if topic_filter_positions.is_empty() {
            return Err(Error::ProtocolViolation("subscribe without subscriptions"));
        }

        header::expect_end(offset, &header)?;

        Ok(Subscribe {
            raw,
            packet_id_pos,
            topic_filter_positions,
        })
    }

    pub fn packet_identifier(&self) -> u16 {
        self.raw.u16_at(self.packet_id_pos)
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = Subscription<'_>> + '_ {
        self.topic_filter_positions.iter().map(move |&pos| {
            let topic_filter = self.raw.str_at(pos);
            let qos = self.raw.u8_at(pos + topic_filter.encoded_size());

            Subscription {
                topic_filter,
                requested_qos: QoS::try_from(qos).unwrap_or_default(),
            }
        })
    }
}

impl_packet!(Subscribe, Subscribe);

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::{subscribe::*, Packet};

    #[test]
    fn test_subscribe_packet_encode_decode() -> mqpp_core::Result<()> {
        let expected = vec![
            0x82, // Packet type: SUBSCRIBE, reserved flags 0b0010
            0x0e, // Remaining length: 14
            0x00, 0x0a, // Packet identifier: 10
            0x00, 0x03, 0x61, 0x2f, 0x62, // Topic filter: "a/b"
            0x01, // Requested QoS: 1
            0x00, 0x03, 0x63, 0x2f, 0x23, // Topic filter: "c/#"
            0x02, // Requested QoS: 2
        ];

        let packet = Subscribe::new(
            10,
            &[
                Subscription::new("a/b", QoS::AtLeastOnce),
                Subscription::new("c/#", QoS::ExactlyOnce),
            ],
        )?;
        assert_eq!(packet.as_bytes(), &expected[..]);

        let new_packet = Subscribe::decode(Bytes::from(expected))?;
        assert_eq!(new_packet.packet_identifier(), 10);

        let subscriptions: Vec<_> = new_packet.subscriptions().collect();
        assert_eq!(
            subscriptions,
            vec![
                Subscription::new("a/b", QoS::AtLeastOnce),
                Subscription::new("c/#", QoS::ExactlyOnce),
            ]
        );
        assert_eq!(packet, new_packet);

        Ok(())
    }

    #[test]
    fn test_subscribe_requires_subscriptions() {
        match Subscribe::new(1, &[]) {
            Err(Error::ProtocolViolation(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        match Subscribe::decode(Bytes::from_static(&[0x82, 0x02, 0x00, 0x01])) {
            Err(Error::ProtocolViolation(reason)) => {
                assert_eq!(reason, "subscribe without subscriptions")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_subscribe_invalid_requested_qos() {
        for qos in [0x03, 0x04, 0x81] {
            let input = vec![0x82, 0x06, 0x00, 0x01, 0x00, 0x01, 0x61, qos];

            match Subscribe::decode(Bytes::from(input)) {
                Err(Error::ProtocolViolation(_)) => {}
                other => panic!("unexpected result for {:#04x}: {:?}", qos, other),
            }
        }
    }

    #[test]
    fn test_subscribe_invalid_flags() {
        let input = vec![0x80, 0x06, 0x00, 0x01, 0x00, 0x01, 0x61, 0x00];

        match Subscribe::decode(Bytes::from(input)) {
            Err(Error::ProtocolViolation(reason)) => {
                assert_eq!(reason, "invalid fixed header flags")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_subscribe_missing_requested_qos() {
        let input = vec![0x82, 0x05, 0x00, 0x01, 0x00, 0x01, 0x61];

        match Subscribe::decode(Bytes::from(input)) {
            Err(Error::ProtocolViolation(reason)) => {
                assert_eq!(reason, "field exceeds packet length")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_subscribe_rejects_filter_with_nul() {
        match Subscribe::new(1, &[Subscription::new("x\0", QoS::AtMostOnce)]) {
            Err(Error::ProtocolViolation(reason)) => assert_eq!(reason, "string contains U+0000"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
