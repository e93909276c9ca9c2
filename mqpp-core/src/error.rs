use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The buffer ends before the value being decoded is complete. Not a
    /// failure: the caller should retry once more bytes have arrived.
    #[error("Need more data")]
    NeedMoreData,

    #[error("Incomplete packet")]
    IncompletePacket,

    #[error("Malformed remaining length ({scanned} bytes scanned)")]
    MalformedRemLen { scanned: usize },

    #[error("Protocol violation: {0}")]
    ProtocolViolation(&'static str),

    #[error("Reserved packet type: {0}")]
    ReservedPacketType(u8),

    #[error("Packet too large: remaining length {0} exceeds 268435455")]
    PacketTooLarge(usize),

    #[error("Field too long: {0} bytes exceeds 65535")]
    FieldTooLong(usize),

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true when the connection that produced this error should be
    /// closed. Only `NeedMoreData` is recoverable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::NeedMoreData)
    }
}
