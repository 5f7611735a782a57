//! Protocol constants

/// Default send timeout (seconds)
pub const DEFAULT_SEND_TIMEOUT: u64 = 10;

/// Default receive timeout (seconds)
pub const DEFAULT_READ_TIMEOUT: u64 = 10;

/// Largest datagram a terminal can answer with
pub const MAX_DATAGRAM_SIZE: usize = 65_535;

/// Reply id of the first frame in a session
pub const INITIAL_REPLY_ID: u16 = 0;

/// Attendance record layout (one fixed-width slot per punch)
pub mod attlog {
    /// Size of one record
    pub const RECORD_SIZE: usize = 40;

    /// User id field: bytes [0, 9), NUL-padded
    pub const USER_ID_LEN: usize = 9;

    /// Verification mode byte
    pub const VERIFY_OFFSET: usize = 26;

    /// Timestamp: bytes [27, 31), LE u32 seconds since the Unix epoch
    pub const TIMESTAMP_OFFSET: usize = 27;

    /// Punch status byte
    pub const STATUS_OFFSET: usize = 31;
}
