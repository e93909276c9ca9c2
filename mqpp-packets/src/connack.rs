use std::fmt;

use bytes::Bytes;

use mqpp_core::{
    error::Error,
    raw::RawPacket,
    Result,
};

use crate::{header, PacketType};

const ACK_FLAGS_POS: usize = 2;
const RETURN_CODE_POS: usize = 3;

/// MQTT 3.1.1 return codes for CONNACK.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ConnectReturnCode {
    #[default]
    Accepted = 0x00,
    UnacceptableProtocolVersion = 0x01,
    IdentifierRejected = 0x02,
    ServerUnavailable = 0x03,
    BadUsernameOrPassword = 0x04,
    NotAuthorized = 0x05,
}

impl TryFrom<u8> for ConnectReturnCode {
    type Error = Error;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        use ConnectReturnCode::*;

        let code = match value {
            0x00 => Accepted,
            0x01 => UnacceptableProtocolVersion,
            0x02 => IdentifierRejected,
            0x03 => ServerUnavailable,
            0x04 => BadUsernameOrPassword,
            0x05 => NotAuthorized,
            _ => return Err(Error::ProtocolViolation("invalid connect return code")),
        };

        Ok(code)
    }
}

impl fmt::Display for ConnectReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            ConnectReturnCode::Accepted => "Connection Accepted",
            ConnectReturnCode::UnacceptableProtocolVersion => {
                "Connection Refused, unacceptable protocol version"
            }
            ConnectReturnCode::IdentifierRejected => "Connection Refused, identifier rejected",
            ConnectReturnCode::ServerUnavailable => "Connection Refused, server unavailable",
            ConnectReturnCode::BadUsernameOrPassword => {
                "Connection Refused, bad user name or password"
            }
            ConnectReturnCode::NotAuthorized => "Connection Refused, not authorized",
        };

        write!(f, "{:#04x} {}", *self as u8, description)
    }
}

/// CONNACK, the server's answer to a CONNECT.
///
/// Layout: acknowledge flags (only bit 0, session present, may be set)
/// followed by the return code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connack {
    raw: RawPacket,
}

impl Connack {
    pub fn new(session_present: bool, return_code: ConnectReturnCode) -> Self {
        let ack_flags = u8::from(session_present);

        Connack {
            raw: RawPacket::two_byte_body(
                PacketType::Connack.first_byte(),
                [ack_flags, return_code as u8],
            ),
        }
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let (raw, header) = header::decode_fixed_header(data, PacketType::Connack)?;

        if header.remaining_length != 2 {
            return Err(Error::ProtocolViolation("remaining length must be 2"));
        }

        let (flags, offset) = raw.byte(header.header_len)?;
        if (flags & 0b1111_1110) != 0 {
            return Err(Error::ProtocolViolation(
                "connack acknowledge flags reserved bits set",
            ));
        }

        let (return_code, _) = raw.byte(offset)?;
        ConnectReturnCode::try_from(return_code)?;

        Ok(Connack { raw })
    }

    pub fn session_present(&self) -> bool {
        self.raw.bit_at(ACK_FLAGS_POS, 0)
    }

    pub fn return_code(&self) -> ConnectReturnCode {
        ConnectReturnCode::try_from(self.raw.u8_at(RETURN_CODE_POS)).unwrap_or_default()
    }
}

impl_packet!(Connack, Connack);
