//! Session bookkeeping for a device connection
//!
//! A session represents a connection to a device and tracks:
//! - Session ID (assigned by device on connect)
//! - Reply counter (embedded in, and advanced after, every frame sent)
//! - Connection state
//!
//! The session is a plain owned value. Whoever owns the device connection
//! owns its session; there is no shared state.

use std::fmt;

use crate::{
    constants::INITIAL_REPLY_ID,
    error::{Error, Result},
};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session
    Disconnected,

    /// CONNECT sent, waiting for the device to assign a session id
    Connecting,

    /// Ready for commands
    Connected,

    /// A command is in flight
    Busy,
}

/// Session manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    device_address: String,
    session_id: u16,
    reply_id: u16,
    state: SessionState,
}

impl Session {
    /// Create a new disconnected session for a device
    pub fn new(device_address: impl Into<String>) -> Self {
        Self {
            device_address: device_address.into(),
            session_id: 0,
            reply_id: INITIAL_REPLY_ID,
            state: SessionState::Disconnected,
        }
    }

    pub fn device_address(&self) -> &str {
        &self.device_address
    }

    /// Get current session ID (0 when disconnected)
    pub fn session_id(&self) -> u16 {
        self.session_id
    }

    /// Reply id the next frame will carry
    pub fn reply_id(&self) -> u16 {
        self.reply_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if connected (idle or with a command in flight)
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected | SessionState::Busy)
    }

    /// Start a handshake
    ///
    /// A live session cannot be re-initialised; [`Session::close`] it first.
    pub fn begin_connect(&mut self) -> Result<()> {
        if self.state != SessionState::Disconnected {
            return Err(Error::InvalidSessionState(format!(
                "Cannot connect from state: {:?}",
                self.state
            )));
        }

        self.session_id = 0;
        self.reply_id = INITIAL_REPLY_ID;
        self.state = SessionState::Connecting;
        Ok(())
    }

    /// Complete the handshake with the device-assigned session id
    pub fn establish(&mut self, session_id: u16) -> Result<()> {
        if self.state != SessionState::Connecting {
            return Err(Error::InvalidSessionState(format!(
                "Cannot establish from state: {:?}",
                self.state
            )));
        }

        self.session_id = session_id;
        self.state = SessionState::Connected;
        Ok(())
    }

    /// Mark a command as in flight
    pub fn begin_command(&mut self) -> Result<()> {
        if self.state != SessionState::Connected {
            return Err(Error::InvalidSessionState(format!(
                "Cannot send command from state: {:?}",
                self.state
            )));
        }

        self.state = SessionState::Busy;
        Ok(())
    }

    /// Return to idle after a command completes (or fails non-fatally)
    pub fn finish_command(&mut self) {
        if self.state == SessionState::Busy {
            self.state = SessionState::Connected;
        }
    }

    /// Take the reply id for the frame about to be sent
    ///
    /// Returns the current value and advances the counter, wrapping at 65536.
    pub fn next_reply_id(&mut self) -> u16 {
        let current = self.reply_id;
        self.reply_id = current.wrapping_add(1);
        current
    }

    /// Reset to disconnected
    pub fn close(&mut self) {
        self.session_id = 0;
        self.reply_id = INITIAL_REPLY_ID;
        self.state = SessionState::Disconnected;
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session[{}](id=0x{:04X}, reply={}, {:?})",
            self.device_address, self.session_id, self.reply_id, self.state
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let mut session = Session::new("10.0.0.5:4370");
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(!session.is_connected());

        session.begin_connect().unwrap();
        assert_eq!(session.state(), SessionState::Connecting);
        assert!(!session.is_connected());

        session.establish(0x1234).unwrap();
        assert_eq!(session.session_id(), 0x1234);
        assert!(session.is_connected());

        session.begin_command().unwrap();
        assert_eq!(session.state(), SessionState::Busy);
        assert!(session.is_connected());

        session.finish_command();
        assert_eq!(session.state(), SessionState::Connected);

        session.close();
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.session_id(), 0);
        assert_eq!(session.reply_id(), 0);
    }

    #[test]
    fn test_reply_id_increments_and_wraps() {
        let mut session = Session::new("dev");
        assert_eq!(session.next_reply_id(), 0);
        assert_eq!(session.next_reply_id(), 1);

        session.reply_id = u16::MAX;
        assert_eq!(session.next_reply_id(), u16::MAX);
        assert_eq!(session.next_reply_id(), 0);
    }

    #[test]
    fn test_cannot_reconnect_live_session() {
        let mut session = Session::new("dev");
        session.begin_connect().unwrap();
        session.establish(1).unwrap();

        assert!(matches!(
            session.begin_connect(),
            Err(Error::InvalidSessionState(_))
        ));

        session.close();
        assert!(session.begin_connect().is_ok());
    }

    #[test]
    fn test_one_command_in_flight() {
        let mut session = Session::new("dev");
        assert!(session.begin_command().is_err());

        session.begin_connect().unwrap();
        session.establish(1).unwrap();
        session.begin_command().unwrap();
        assert!(session.begin_command().is_err());
    }

    #[test]
    fn test_establish_requires_handshake() {
        let mut session = Session::new("dev");
        assert!(session.establish(7).is_err());
    }
}
