//! # punchsync-core
//!
//! Core protocol implementation for ZKTeco time-clock terminals.
//!
//! This crate provides the low-level protocol primitives:
//! - Command frame encoding and reply header parsing
//! - Checksum calculation
//! - Command definitions
//! - Attendance record decoding
//! - Session bookkeeping (session id, reply counter, state)

pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod packet;
pub mod record;
pub mod session;

pub use command::Command;
pub use error::{Error, Result};
pub use packet::{CommandFrame, Reply};
pub use record::decode_attendance_reply;
pub use session::{Session, SessionState};

/// Default device port
pub const DEFAULT_PORT: u16 = 4370;

/// Frame header size
pub const HEADER_SIZE: usize = 8;
