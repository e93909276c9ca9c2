//! MQTT protocol name and level handling.

use core::fmt;

/// Protocol name carried by MQTT 3.1.1 CONNECT packets.
pub const PROTOCOL_NAME: &str = "MQTT";

/// Protocol level carried by MQTT 3.1.1 CONNECT packets.
pub const PROTOCOL_LEVEL: u8 = 4;

/// MQTT protocol version announced by a CONNECT packet.
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum ProtocolVersion {
    /// MQTT 3.1 - Protocol name "MQIsdp", level 3
    V3_1 = 3,
    /// MQTT 3.1.1 - Protocol name "MQTT", level 4
    #[default]
    V3_1_1 = 4,
}

impl ProtocolVersion {
    /// Returns the protocol name string for this version.
    pub fn protocol_name(&self) -> &'static str {
        match self {
            ProtocolVersion::V3_1 => "MQIsdp",
            ProtocolVersion::V3_1_1 => PROTOCOL_NAME,
        }
    }

    /// Returns the protocol level byte for this version.
    pub fn protocol_level(&self) -> u8 {
        *self as u8
    }

    /// Attempts to determine the protocol version from protocol name and level.
    ///
    /// Returns `None` if the combination is invalid or unsupported.
    pub fn from_name_and_level(name: &str, level: u8) -> Option<ProtocolVersion> {
        match (name, level) {
            ("MQIsdp", 3) => Some(ProtocolVersion::V3_1),
            (PROTOCOL_NAME, PROTOCOL_LEVEL) => Some(ProtocolVersion::V3_1_1),
            _ => None,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V3_1 => write!(f, "MQTT 3.1"),
            ProtocolVersion::V3_1_1 => write!(f, "MQTT 3.1.1"),
        }
    }
}
