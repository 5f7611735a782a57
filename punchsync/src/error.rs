//! High-level error types

use std::time::Duration;

use punchsync_core::Command;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] punchsync_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] punchsync_transport::Error),

    #[error("Device not connected")]
    NotConnected,

    #[error("Device already connected")]
    AlreadyConnected,

    /// No matching reply before the receive deadline
    #[error("No reply to {command} within {after:?}")]
    Timeout { command: Command, after: Duration },

    /// Device answered with an error code
    #[error("Device rejected {command} with reply code {code}")]
    Rejected { command: Command, code: u16 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
