//! Protocol command definitions

use std::fmt;

use crate::error::{Error, Result};

/// Protocol command codes
///
/// Request codes used by the attendance sync flow plus the reply codes a
/// terminal answers with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Command {
    // Connection commands
    Connect = 1000,
    Exit = 1001,
    EnableDevice = 1002,
    DisableDevice = 1003,

    // Attendance log
    GetAttendance = 13,
    ClearAttendance = 14,

    // Response commands (from device)
    AckOk = 2000,
    AckError = 2001,
    AckData = 2002,
    AckRetry = 2003,
    AckRepeat = 2004,
    AckUnauth = 2005,
    AckUnknown = 0xFFFF,
    AckErrorCmd = 0xFFFD,
    AckErrorInit = 0xFFFC,
    AckErrorData = 0xFFFB,
}

impl Command {
    /// Check if this is a request command (from PC to device)
    pub fn is_request(self) -> bool {
        !self.is_response()
    }

    /// Check if this is a response command (from device to PC)
    pub fn is_response(self) -> bool {
        matches!(
            self,
            Self::AckOk
                | Self::AckError
                | Self::AckData
                | Self::AckRetry
                | Self::AckRepeat
                | Self::AckUnauth
                | Self::AckUnknown
                | Self::AckErrorCmd
                | Self::AckErrorInit
                | Self::AckErrorData
        )
    }

    /// Check if this is a success response
    pub fn is_success(self) -> bool {
        matches!(self, Self::AckOk | Self::AckData)
    }

    /// Check if this is an error response
    pub fn is_error(self) -> bool {
        matches!(
            self,
            Self::AckError
                | Self::AckUnauth
                | Self::AckErrorCmd
                | Self::AckErrorInit
                | Self::AckErrorData
        )
    }

    /// Get command name
    pub fn name(self) -> &'static str {
        match self {
            Self::Connect => "CMD_CONNECT",
            Self::Exit => "CMD_EXIT",
            Self::EnableDevice => "CMD_ENABLEDEVICE",
            Self::DisableDevice => "CMD_DISABLEDEVICE",
            Self::GetAttendance => "CMD_ATTLOG_RRQ",
            Self::ClearAttendance => "CMD_CLEAR_ATTLOG",
            Self::AckOk => "CMD_ACK_OK",
            Self::AckError => "CMD_ACK_ERROR",
            Self::AckData => "CMD_ACK_DATA",
            Self::AckRetry => "CMD_ACK_RETRY",
            Self::AckRepeat => "CMD_ACK_REPEAT",
            Self::AckUnauth => "CMD_ACK_UNAUTH",
            _ => "CMD_ACK_UNKNOWN",
        }
    }
}

impl From<Command> for u16 {
    fn from(cmd: Command) -> u16 {
        cmd as u16
    }
}

impl TryFrom<u16> for Command {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            1000 => Ok(Self::Connect),
            1001 => Ok(Self::Exit),
            1002 => Ok(Self::EnableDevice),
            1003 => Ok(Self::DisableDevice),
            13 => Ok(Self::GetAttendance),
            14 => Ok(Self::ClearAttendance),
            2000 => Ok(Self::AckOk),
            2001 => Ok(Self::AckError),
            2002 => Ok(Self::AckData),
            2003 => Ok(Self::AckRetry),
            2004 => Ok(Self::AckRepeat),
            2005 => Ok(Self::AckUnauth),
            0xFFFF => Ok(Self::AckUnknown),
            0xFFFD => Ok(Self::AckErrorCmd),
            0xFFFC => Ok(Self::AckErrorInit),
            0xFFFB => Ok(Self::AckErrorData),
            _ => Err(Error::UnknownCommand(value)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), *self as u16)
    }
}
