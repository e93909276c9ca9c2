use bytes::Bytes;

use mqpp_core::{
    codec::{Encoder, LengthPrefixed},
    error::Error,
    protocol::ProtocolVersion,
    qos::QoS,
    raw::{PacketWriter, RawPacket},
    Result,
};

use crate::{header, PacketType};

const USERNAME_BIT: u8 = 7;
const PASSWORD_BIT: u8 = 6;
const WILL_RETAIN_BIT: u8 = 5;
const WILL_FLAG_BIT: u8 = 2;
const CLEAN_SESSION_BIT: u8 = 1;
const RESERVED_BIT: u8 = 0;

/// Will message configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Will {
    pub topic: String,
    pub message: Bytes,
    pub qos: QoS,
    pub retain: bool,
}

impl Will {
    pub fn new(topic: impl Into<String>, message: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            message: message.into(),
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }

    pub fn qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }
}

/// Builds a [`Connect`] packet.
#[derive(Debug, Clone)]
pub struct ConnectBuilder {
    protocol_version: ProtocolVersion,
    client_id: String,
    keep_alive: u16,
    clean_session: bool,
    will: Option<Will>,
    username: Option<String>,
    password: Option<Bytes>,
}

impl ConnectBuilder {
    /// Set the protocol name and level announced to the server.
    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    /// Set the keep-alive interval in seconds.
    pub fn keep_alive(mut self, seconds: u16) -> Self {
        self.keep_alive = seconds;
        self
    }

    /// Set clean session flag. If true, the server will discard any existing session.
    pub fn clean_session(mut self, clean: bool) -> Self {
        self.clean_session = clean;
        self
    }

    /// Set the will message to be published if the client disconnects unexpectedly.
    pub fn will(mut self, will: Will) -> Self {
        self.will = Some(will);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password. MQTT 3.1.1 only allows a password together with a username.
    pub fn password(mut self, password: impl Into<Bytes>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn build(self) -> Result<Connect> {
        let protocol_name = self.protocol_version.protocol_name();
        let protocol_level = self.protocol_version.protocol_level();

        if self.password.is_some() && self.username.is_none() {
            return Err(Error::ProtocolViolation(
                "password flag set without username flag",
            ));
        }

        let will_topic = self.will.as_ref().map(|w| w.topic.as_str());
        let will_message = self.will.as_ref().map(|w| LengthPrefixed(&w.message));
        let password = self.password.as_ref().map(|p| LengthPrefixed(p));
        let will_qos = self.will.as_ref().map(|w| w.qos).unwrap_or_default();
        let will_retain = self.will.as_ref().map(|w| w.retain).unwrap_or_default();

        let mut remaining_len = 0;

        remaining_len += protocol_name.encoded_size();
        remaining_len += protocol_level.encoded_size();
        remaining_len += 0u8.encoded_size(); // connect flags
        remaining_len += self.keep_alive.encoded_size();
        remaining_len += self.client_id.encoded_size();
        remaining_len += will_topic.encoded_size();
        remaining_len += will_message.encoded_size();
        remaining_len += self.username.encoded_size();
        remaining_len += password.encoded_size();

        let mut writer = PacketWriter::new(PacketType::Connect.first_byte(), remaining_len)?;

        let protocol_name_pos = writer.offset();
        let protocol_level_pos = writer.put(protocol_name)?;
        let connect_flags_pos = writer.put(&protocol_level)?;
        let keep_alive_pos = writer.put(&((will_qos as u8) << 3))?;
        writer
            .set_bit(connect_flags_pos, USERNAME_BIT, self.username.is_some())
            .set_bit(connect_flags_pos, PASSWORD_BIT, password.is_some())
            .set_bit(connect_flags_pos, WILL_RETAIN_BIT, will_retain)
            .set_bit(connect_flags_pos, WILL_FLAG_BIT, self.will.is_some())
            .set_bit(connect_flags_pos, CLEAN_SESSION_BIT, self.clean_session);
        let client_id_pos = writer.put(&self.keep_alive)?;
        let mut offset = writer.put(self.client_id.as_str())?;

        let mut will_topic_pos = None;
        let mut will_message_pos = None;
        if let (Some(topic), Some(message)) = (will_topic, will_message) {
            will_topic_pos = Some(offset);
            will_message_pos = Some(writer.put(topic)?);
            offset = writer.put(&message)?;
        }

        let mut username_pos = None;
        if let Some(username) = &self.username {
            username_pos = Some(offset);
            offset = writer.put(username.as_str())?;
        }

        let mut password_pos = None;
        if let Some(password) = &password {
            password_pos = Some(offset);
            writer.put(password)?;
        }

        Ok(Connect {
            raw: writer.finish()?,
            protocol_name_pos,
            protocol_level_pos,
            connect_flags_pos,
            keep_alive_pos,
            client_id_pos,
            will_topic_pos,
            will_message_pos,
            username_pos,
            password_pos,
        })
    }
}

/// CONNECT, the first packet a client sends.
///
/// Variable header: protocol name, protocol level, connect flags, keep alive.
/// Payload: client identifier, then will topic and will message, user name
/// and password, each present only when its flag is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connect {
    raw: RawPacket,
    protocol_name_pos: usize,
    protocol_level_pos: usize,
    connect_flags_pos: usize,
    keep_alive_pos: usize,
    client_id_pos: usize,
    will_topic_pos: Option<usize>,
    will_message_pos: Option<usize>,
    username_pos: Option<usize>,
    password_pos: Option<usize>,
}

impl Connect {
    /// Start building a MQTT 3.1.1 CONNECT with a clean session and a 60
    /// second keep-alive.
    pub fn builder(client_id: impl Into<String>) -> ConnectBuilder {
        ConnectBuilder {
            protocol_version: ProtocolVersion::V3_1_1,
            client_id: client_id.into(),
            keep_alive: 60,
            clean_session: true,
            will: None,
            username: None,
            password: None,
        }
    }

    pub fn decode(data: Bytes) -> Result<Self> {
        let (raw, header) = header::decode_fixed_header(data, PacketType::Connect)?;

        let protocol_name_pos = header.header_len;
        let (_, protocol_level_pos) = raw.string(protocol_name_pos)?;
        let (_, connect_flags_pos) = raw.byte(protocol_level_pos)?;
        let (flags, keep_alive_pos) = raw.byte(connect_flags_pos)?;

        let flag = |bit: u8| (flags & (1 << bit)) != 0;

        if flag(RESERVED_BIT) {
            return Err(Error::ProtocolViolation("connect flags reserved bit set"));
        }

        let will_qos = QoS::try_from((flags >> 3) & 0b0000_0011)?;
        if !flag(WILL_FLAG_BIT) && (will_qos != QoS::AtMostOnce || flag(WILL_RETAIN_BIT)) {
            return Err(Error::ProtocolViolation(
                "will QoS or will retain set without will flag",
            ));
        }

        if flag(PASSWORD_BIT) && !flag(USERNAME_BIT) {
            return Err(Error::ProtocolViolation(
                "password flag set without username flag",
            ));
        }

        let (_, client_id_pos) = raw.uint16(keep_alive_pos)?;
        let (_, mut offset) = raw.string(client_id_pos)?;

        let mut will_topic_pos = None;
        let mut will_message_pos = None;
        if flag(WILL_FLAG_BIT) {
            will_topic_pos = Some(offset);
            let (_, message_pos) = raw.string(offset)?;
            will_message_pos = Some(message_pos);
            let (_, next) = raw.binary(message_pos)?;
            offset = next;
        }

        let mut username_pos = None;
        if flag(USERNAME_BIT) {
            username_pos = Some(offset);
            let (_, next) = raw.string(offset)?;
            offset = next;
        }

        let mut password_pos = None;
        if flag(PASSWORD_BIT) {
            password_pos = Some(offset);
            let (_, next) = raw.binary(offset)?;
            offset = next;
        }

        header::expect_end(offset, &header)?;

        Ok(Connect {
            raw,
            protocol_name_pos,
            protocol_level_pos,
            connect_flags_pos,
            keep_alive_pos,
            client_id_pos,
            will_topic_pos,
            will_message_pos,
            username_pos,
            password_pos,
        })
    }

    /// "MQTT" for 3.1.1.
    pub fn protocol_name(&self) -> &str {
        self.raw.str_at(self.protocol_name_pos)
    }

    /// 4 for 3.1.1.
    pub fn protocol_level(&self) -> u8 {
        self.raw.u8_at(self.protocol_level_pos)
    }

    /// The protocol version named by the protocol name and level, if known.
    /// Servers answer an unknown one with
    /// [`ConnectReturnCode::UnacceptableProtocolVersion`](crate::connack::ConnectReturnCode).
    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        ProtocolVersion::from_name_and_level(self.protocol_name(), self.protocol_level())
    }

    pub fn username_flag(&self) -> bool {
        self.raw.bit_at(self.connect_flags_pos, USERNAME_BIT)
    }

    pub fn password_flag(&self) -> bool {
        self.raw.bit_at(self.connect_flags_pos, PASSWORD_BIT)
    }

    pub fn will_retain(&self) -> bool {
        self.raw.bit_at(self.connect_flags_pos, WILL_RETAIN_BIT)
    }

    pub fn will_qos(&self) -> QoS {
        let flags = self.raw.u8_at(self.connect_flags_pos);
        QoS::try_from((flags >> 3) & 0b0000_0011).unwrap_or_default()
    }

    pub fn will_flag(&self) -> bool {
        self.raw.bit_at(self.connect_flags_pos, WILL_FLAG_BIT)
    }

    pub fn clean_session(&self) -> bool {
        self.raw.bit_at(self.connect_flags_pos, CLEAN_SESSION_BIT)
    }

    pub fn keep_alive(&self) -> u16 {
        self.raw.u16_at(self.keep_alive_pos)
    }

    pub fn client_id(&self) -> &str {
        self.raw.str_at(self.client_id_pos)
    }

    pub fn will_topic(&self) -> Option<&str> {
        self.will_topic_pos.map(|pos| self.raw.str_at(pos))
    }

    pub fn will_message(&self) -> Option<&[u8]> {
        self.will_message_pos.map(|pos| self.raw.binary_at(pos))
    }

    pub fn username(&self) -> Option<&str> {
        self.username_pos.map(|pos| self.raw.str_at(pos))
    }

    pub fn password(&self) -> Option<&[u8]> {
        self.password_pos.map(|pos| self.raw.binary_at(pos))
    }
}

impl_packet!(Connect, Connect);
