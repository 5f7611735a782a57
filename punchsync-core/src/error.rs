//! Error types for punchsync-core

/// Result type alias for punchsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Datagram is too short to carry a reply header
    #[error("Packet too short: expected at least {expected} bytes, got {actual} bytes")]
    PacketTooShort {
        expected: usize,
        actual: usize,
    },

    /// Unknown command code
    #[error("Unknown command code: {0}")]
    UnknownCommand(u16),

    /// Invalid session state transition
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    /// Attendance record slot is shorter than a full record
    #[error("Record too short: expected {expected} bytes, got {actual} bytes")]
    RecordTooShort {
        expected: usize,
        actual: usize,
    },

    /// User id bytes are not valid text
    #[error("Invalid user id {bytes:02X?}: {reason}")]
    InvalidUserId {
        bytes: Vec<u8>,
        reason: std::str::Utf8Error,
    },

    /// Timestamp cannot be represented as a calendar date
    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(u32),
}
