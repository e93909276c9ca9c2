use std::fmt;

use bytes::Bytes;

use mqpp_core::{
    codec::Encoder,
    error::Error,
    qos::QoS,
    raw::{PacketWriter, RawPacket},
    Result,
};

use crate::{header, PacketType};

const FAILURE: u8 = 0x80;

/// Outcome of one subscription in a SUBSCRIBE request, in request order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SubackReturnCode {
    /// Granted at the given maximum QoS.
    Success(QoS),
    Failure,
}

impl TryFrom<u8> for SubackReturnCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            FAILURE => Ok(SubackReturnCode::Failure),
            v => match QoS::try_from(v) {
                Ok(qos) => Ok(SubackReturnCode::Success(qos)),
                Err(_) => Err(Error::ProtocolViolation("invalid suback return code")),
            },
        }
    }
}

impl From<SubackReturnCode> for u8 {
    fn from(code: SubackReturnCode) -> u8 {
        match code {
            SubackReturnCode::Success(qos) => qos.into(),
            SubackReturnCode::Failure => FAILURE,
        }
    }
}

impl fmt::Display for SubackReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubackReturnCode::Success(qos) => write!(f, "granted QoS {}", u8::from(*qos)),
            SubackReturnCode::Failure => write!(f, "failure"),
        }
    }
}

/// SUBACK, the server's answer to a SUBSCRIBE.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suback {
    raw: RawPacket,
    packet_id_pos: usize,
}

impl Suback {
    pub fn new(packet_id: u16, return_codes: &[SubackReturnCode]) -> Result<Self> {
        if return_codes.is_empty() {
            return Err(Error::ProtocolViolation("suback without return codes"));
        }

        let remaining_len = packet_id.encoded_size() + return_codes.len();

        let mut writer = PacketWriter::new(PacketType::Suback.first_byte(), remaining_len)?;
        let packet_id_pos = writer.offset();
        writer.put(&packet_id)?;

        for code in return_codes {
            writer.put(&u8::from(*code))?;
        }

        Ok(Suback {
            raw: writer.finish()?,
            packet_id_pos,
        })
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let (raw, header) = header::decode_fixed_header(data, PacketType::Suback)?;

        let packet_id_pos = header.header_len;
        let (_, codes_pos) = raw.uint16(packet_id_pos)?;

        let codes = raw.tail(codes_pos);
        if codes.is_empty() {
            return Err(Error::ProtocolViolation("suback without return codes"));
        }

        for code in codes {
            SubackReturnCode::try_from(*code)?;
        }

        Ok(Suback { raw, packet_id_pos })
    }

    pub fn packet_identifier(&self) -> u16 {
        self.raw.u16_at(self.packet_id_pos)
    }

    pub fn return_codes(&self) -> impl Iterator<Item = SubackReturnCode> + '_ {
        self.raw
            .tail(self.packet_id_pos + 2)
            .iter()
            .map(|code| SubackReturnCode::try_from(*code).unwrap_or(SubackReturnCode::Failure))
    }
}

impl_packet!(Suback, Suback);

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::{suback::*, Packet};

    #[test]
    fn test_suback_packet_encode_decode() -> mqpp_core::Result<()> {
        let expected = vec![
            0x90, // Packet type: SUBACK
            0x05, // Remaining length: 5
            0x00, 0x0a, // Packet identifier: 10
            0x01, 0x80, 0x00, // Return codes
        ];

        let codes = [
            SubackReturnCode::Success(QoS::AtLeastOnce),
            SubackReturnCode::Failure,
            SubackReturnCode::Success(QoS::AtMostOnce),
        ];

        let packet = Suback::new(10, &codes)?;
        assert_eq!(packet.as_bytes(), &expected[..]);

        let new_packet = Suback::decode(Bytes::from(expected))?;
        assert_eq!(new_packet.packet_identifier(), 10);
        assert_eq!(new_packet.return_codes().collect::<Vec<_>>(), codes);
        assert_eq!(packet, new_packet);

        Ok(())
    }

    #[test]
    fn test_suback_invalid_return_code() {
        for code in [0x03, 0x7f, 0x81] {
            let input = vec![0x90, 0x03, 0x00, 0x01, code];

            match Suback::decode(Bytes::from(input)) {
                Err(Error::ProtocolViolation(reason)) => {
                    assert_eq!(reason, "invalid suback return code")
                }
                other => panic!("unexpected result for {:#04x}: {:?}", code, other),
            }
        }
    }

    #[test]
    fn test_suback_requires_return_codes() {
        match Suback::new(1, &[]) {
            Err(Error::ProtocolViolation(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        match Suback::decode(Bytes::from_static(&[0x90, 0x02, 0x00, 0x01])) {
            Err(Error::ProtocolViolation(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_suback_return_code_display() {
        assert_eq!(
            SubackReturnCode::Success(QoS::ExactlyOnce).to_string(),
            "granted QoS 2"
        );
        assert_eq!(SubackReturnCode::Failure.to_string(), "failure");
        assert_eq!(u8::from(SubackReturnCode::Failure), 0x80);
    }
}
