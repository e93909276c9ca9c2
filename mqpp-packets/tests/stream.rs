use bytes::{Bytes, BytesMut};

use mqpp_core::{codec::Encoder, error::Error, protocol::ProtocolVersion, qos::QoS};
use mqpp_packets::{
    connack::{Connack, ConnectReturnCode},
    connect::{Connect, Will},
    disconnect::Disconnect,
    frame::{next_packet, split_packet, Frame},
    pingreq::Pingreq,
    pingresp::Pingresp,
    puback::Puback,
    pubcomp::Pubcomp,
    publish::Publish,
    pubrec::Pubrec,
    pubrel::Pubrel,
    suback::{Suback, SubackReturnCode},
    subscribe::{Subscribe, Subscription},
    unsuback::Unsuback,
    unsubscribe::Unsubscribe,
    ControlPacket, Packet, PacketType,
};

fn session() -> mqpp_core::Result<Vec<ControlPacket>> {
    Ok(vec![
        Connect::builder("sensor-1")
            .keep_alive(10)
            .will(Will::new("sensors/1/status", "offline").retain(true))
            .username("sensor")
            .password("secret")
            .build()?
            .into(),
        Connack::new(false, ConnectReturnCode::Accepted).into(),
        Subscribe::new(
            1,
            &[
                Subscription::new("cmd/1", QoS::AtLeastOnce),
                Subscription::new("cmd/all", QoS::AtMostOnce),
            ],
        )?
        .into(),
        Suback::new(
            1,
            &[
                SubackReturnCode::Success(QoS::AtLeastOnce),
                SubackReturnCode::Failure,
            ],
        )?
        .into(),
        Publish::new(false, QoS::AtMostOnce, false, "sensors/1/temp", 0, b"21.5")?.into(),
        Publish::new(false, QoS::AtLeastOnce, false, "sensors/1/temp", 2, b"21.6")?.into(),
        Puback::new(2).into(),
        Publish::new(true, QoS::ExactlyOnce, true, "sensors/1/state", 3, &[0u8; 300])?.into(),
        Pubrec::new(3).into(),
        Pubrel::new(3).into(),
        Pubcomp::new(3).into(),
        Unsubscribe::new(4, &["cmd/all"])?.into(),
        Unsuback::new(4).into(),
        Pingreq::new().into(),
        Pingresp::new().into(),
        Disconnect::new().into(),
    ])
}

fn encode_all(packets: &[ControlPacket]) -> BytesMut {
    let mut buffer = BytesMut::new();
    for packet in packets {
        packet.encode(&mut buffer);
    }
    buffer
}

#[test]
fn test_frame_and_decode_session() -> mqpp_core::Result<()> {
    let packets = session()?;
    let stream = encode_all(&packets).freeze();

    let mut decoded = Vec::new();
    let mut offset = 0;
    loop {
        match next_packet(&stream[offset..], true)? {
            Frame::NeedMoreData => break,
            frame => {
                let end = offset + frame.consumed();
                decoded.push(ControlPacket::decode(stream.slice(offset..end))?);
                offset = end;
            }
        }
    }

    assert_eq!(offset, stream.len());
    assert_eq!(decoded, packets);

    Ok(())
}

#[test]
fn test_split_session_byte_by_byte() -> mqpp_core::Result<()> {
    let packets = session()?;
    let stream = encode_all(&packets);

    let mut buffer = BytesMut::new();
    let mut decoded = Vec::new();
    for byte in stream.iter() {
        buffer.extend_from_slice(&[*byte]);

        while let Some(frame) = split_packet(&mut buffer, false)? {
            decoded.push(ControlPacket::decode(frame)?);
        }
    }

    assert!(buffer.is_empty());
    assert_eq!(
        decoded.iter().map(|p| p.packet_type()).collect::<Vec<_>>(),
        packets.iter().map(|p| p.packet_type()).collect::<Vec<_>>()
    );
    assert_eq!(decoded, packets);

    Ok(())
}

#[test]
fn test_decoded_fields_survive_framing() -> mqpp_core::Result<()> {
    let packets = session()?;
    let mut buffer = encode_all(&packets);

    let frame = split_packet(&mut buffer, true)?.ok_or(Error::NeedMoreData)?;
    match ControlPacket::decode(frame)? {
        ControlPacket::Connect(connect) => {
            assert_eq!(connect.protocol_version(), Some(ProtocolVersion::V3_1_1));
            assert_eq!(connect.client_id(), "sensor-1");
            assert_eq!(connect.keep_alive(), 10);
            assert_eq!(connect.will_topic(), Some("sensors/1/status"));
            assert_eq!(connect.will_message(), Some(&b"offline"[..]));
            assert_eq!(connect.will_qos(), QoS::AtMostOnce);
            assert!(connect.will_retain());
            assert_eq!(connect.username(), Some("sensor"));
            assert_eq!(connect.password(), Some(&b"secret"[..]));
        }
        other => panic!("unexpected packet: {:?}", other),
    }

    let mut publishes = Vec::new();
    while let Some(frame) = split_packet(&mut buffer, true)? {
        if let ControlPacket::Publish(publish) = ControlPacket::decode(frame)? {
            publishes.push(publish);
        }
    }

    assert_eq!(publishes.len(), 3);
    assert_eq!(publishes[0].packet_identifier(), 0);
    assert_eq!(publishes[1].payload(), b"21.6");

    let large = &publishes[2];
    assert!(large.dup());
    assert!(large.retain());
    assert_eq!(large.qos(), QoS::ExactlyOnce);
    assert_eq!(large.topic_name(), "sensors/1/state");
    assert_eq!(large.packet_identifier(), 3);
    assert_eq!(large.payload_bytes(), Bytes::from(vec![0u8; 300]));
    assert_eq!(large.length(), 1 + 2 + 17 + 2 + 300);

    Ok(())
}

#[test]
fn test_pingreq_then_pingresp() -> mqpp_core::Result<()> {
    let stream = [0xc0, 0x00, 0xd0, 0x00];

    let frame = next_packet(&stream, false)?;
    assert_eq!(frame.consumed(), 2);
    let packet = ControlPacket::from_slice(&stream[..frame.consumed()])?;
    assert_eq!(packet.packet_type(), PacketType::Pingreq);

    let rest = &stream[frame.consumed()..];
    let frame = next_packet(rest, false)?;
    assert_eq!(frame, Frame::Packet(&[0xd0, 0x00]));
    let packet = ControlPacket::from_slice(&rest[..frame.consumed()])?;
    assert_eq!(packet.packet_type(), PacketType::Pingresp);

    Ok(())
}

#[test]
fn test_truncated_stream() -> mqpp_core::Result<()> {
    let mut stream = encode_all(&session()?);
    stream.truncate(stream.len() - 1);

    let mut frames = 0;
    loop {
        match split_packet(&mut stream, true) {
            Ok(Some(_)) => frames += 1,
            Ok(None) => panic!("stream ended without error"),
            Err(Error::IncompletePacket) => break,
            Err(e) => return Err(e),
        }
    }

    // the final DISCONNECT lost its remaining length byte
    assert_eq!(frames, 15);
    assert_eq!(&stream[..], &[0xe0]);

    Ok(())
}

#[test]
fn test_framed_but_invalid_packets() {
    let cases: [(&[u8], &str); 4] = [
        // CONNACK with session present bits outside bit 0
        (&[0x20, 0x02, 0x02, 0x00], "protocol violation"),
        // CONNACK with return code 6
        (&[0x20, 0x02, 0x00, 0x06], "protocol violation"),
        // PUBREL without its reserved flags
        (&[0x60, 0x02, 0x00, 0x01], "protocol violation"),
        // AUTH only exists in MQTT 5
        (&[0xf0, 0x00], "reserved"),
    ];

    for (data, kind) in cases {
        let frame = match next_packet(data, true) {
            Ok(Frame::Packet(frame)) => frame,
            other => panic!("unexpected frame for {:02x?}: {:?}", data, other),
        };

        match (ControlPacket::from_slice(frame), kind) {
            (Err(Error::ProtocolViolation(_)), "protocol violation") => {}
            (Err(Error::ReservedPacketType(0x0f)), "reserved") => {}
            (other, _) => panic!("unexpected result for {:02x?}: {:?}", data, other),
        }
    }
}

#[test]
fn test_trailing_bytes_are_not_part_of_packet() -> mqpp_core::Result<()> {
    let packet = Puback::decode(Bytes::from_static(&[0x40, 0x02, 0x00, 0x09, 0xc0, 0x00]))?;

    assert_eq!(packet.as_bytes(), &[0x40, 0x02, 0x00, 0x09]);
    assert_eq!(packet.length(), 4);
    assert_eq!(packet.packet_identifier(), 9);

    Ok(())
}
