//! Command frame encoding and reply header parsing

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    command::Command,
    error::{Error, Result},
    HEADER_SIZE,
};

/// Outgoing command frame
///
/// # Frame Structure
///
/// ```text
/// ┌─────────────┬─────────────┬─────────────┬─────────────┬─────────────┐
/// │   Command   │  Checksum   │  SessionID  │  ReplyID    │   Payload   │
/// │   2 bytes   │   2 bytes   │   2 bytes   │   2 bytes   │   N bytes   │
/// │ (LE u16)    │  (LE u16)   │  (LE u16)   │  (LE u16)   │   (bytes)   │
/// └─────────────┴─────────────┴─────────────┴─────────────┴─────────────┘
/// ```
///
/// The checksum is computed once in [`CommandFrame::new`]; a frame has no
/// setters, so the checksum always matches the fields it was built from.
///
/// # Examples
///
/// ```
/// use punchsync_core::{CommandFrame, Command};
///
/// let frame = CommandFrame::new(Command::Connect, 0, 0, Vec::new());
/// assert_eq!(frame.checksum(), 0xFC17);
/// assert_eq!(frame.encode().len(), 8);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CommandFrame {
    command: Command,
    checksum: u16,
    session_id: u16,
    reply_id: u16,
    payload: Bytes,
}

impl CommandFrame {
    /// Build a frame and compute its checksum
    pub fn new(
        command: Command,
        session_id: u16,
        reply_id: u16,
        payload: impl Into<Bytes>,
    ) -> Self {
        let payload = payload.into();
        let checksum = checksum::calculate(command.into(), session_id, reply_id, &payload);

        Self {
            command,
            checksum,
            session_id,
            reply_id,
            payload,
        }
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn session_id(&self) -> u16 {
        self.session_id
    }

    pub fn reply_id(&self) -> u16 {
        self.reply_id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Encode frame to bytes
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_u16_le(self.command.into());
        buf.put_u16_le(self.checksum);
        buf.put_u16_le(self.session_id);
        buf.put_u16_le(self.reply_id);
        buf.put_slice(&self.payload);

        buf.freeze()
    }

    /// Get total frame size
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame in one step
pub fn encode(command: Command, session_id: u16, reply_id: u16, payload: &[u8]) -> Bytes {
    CommandFrame::new(command, session_id, reply_id, Bytes::copy_from_slice(payload)).encode()
}

impl fmt::Debug for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandFrame")
            .field("command", &self.command)
            .field("session_id", &format!("0x{:04X}", self.session_id))
            .field("reply_id", &self.reply_id)
            .field("checksum", &format!("0x{:04X}", self.checksum))
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame[{}](session={}, reply={}, len={})",
            self.command,
            self.session_id,
            self.reply_id,
            self.payload.len()
        )
    }
}

/// Datagram received from a terminal
///
/// Only the header is interpreted here; the raw datagram is kept intact
/// because bulk replies (attendance logs) are decoded from the full buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    checksum: u16,
    session_id: u16,
    reply_id: u16,
    raw: Bytes,
}

impl Reply {
    /// Parse the header of a received datagram
    ///
    /// # Errors
    ///
    /// Returns [`Error::PacketTooShort`] if the datagram is shorter than a header.
    pub fn parse(raw: Bytes) -> Result<Self> {
        if raw.len() < HEADER_SIZE {
            return Err(Error::PacketTooShort {
                expected: HEADER_SIZE,
                actual: raw.len(),
            });
        }

        let mut header = &raw[..HEADER_SIZE];
        let code = header.get_u16_le();
        let checksum = header.get_u16_le();
        let session_id = header.get_u16_le();
        let reply_id = header.get_u16_le();

        Ok(Self {
            code,
            checksum,
            session_id,
            reply_id,
            raw,
        })
    }

    /// Raw command code
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Command code, if it is one we know
    pub fn command(&self) -> Option<Command> {
        Command::try_from(self.code).ok()
    }

    pub fn session_id(&self) -> u16 {
        self.session_id
    }

    pub fn reply_id(&self) -> u16 {
        self.reply_id
    }

    /// Bytes after the header
    pub fn payload(&self) -> &[u8] {
        &self.raw[HEADER_SIZE..]
    }

    /// Whole datagram, header included
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Check the header checksum against the rest of the datagram
    pub fn checksum_valid(&self) -> bool {
        checksum::verify(
            self.code,
            self.session_id,
            self.reply_id,
            self.payload(),
            self.checksum,
        )
    }

    /// Check if the device reported an error
    pub fn is_error(&self) -> bool {
        self.command().is_some_and(Command::is_error)
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("code", &self.code)
            .field("session_id", &format!("0x{:04X}", self.session_id))
            .field("reply_id", &self.reply_id)
            .field("checksum", &format!("0x{:04X}", self.checksum))
            .field("payload_len", &self.payload().len())
            .finish()
    }
}
