//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Send timeout")]
    WriteTimeout,

    #[error("Read timeout")]
    ReadTimeout,

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl Error {
    /// Check if the channel is unusable after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotConnected | Self::ConnectionClosed)
    }

    /// Check if this is a send or receive deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::WriteTimeout | Self::ReadTimeout)
    }
}
