//! Upload errors
//!
//! Delivery failures are never errors; they are reported per chunk in a
//! `BatchResult`. Only setup problems surface here.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
