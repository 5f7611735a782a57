//! Transport layer for device communication
//!
//! A device session talks to its terminal through the [`Transport`] trait.
//! [`UdpTransport`] is the datagram channel used by real terminals; tests
//! substitute scripted implementations.

pub mod error;
pub mod udp;

pub use error::{Error, Result};
pub use udp::UdpTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

/// Datagram channel to one device
#[async_trait]
pub trait Transport: Send {
    /// Open the channel
    async fn connect(&mut self) -> Result<()>;

    /// Close the channel
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send one datagram
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive one datagram, waiting at most `timeout`
    async fn receive(&mut self, timeout: Duration) -> Result<Bytes>;

    /// Get remote address
    fn remote_addr(&self) -> String;
}
