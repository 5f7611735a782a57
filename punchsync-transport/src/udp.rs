//! UDP transport for time-clock terminals
//!
//! Terminals answer on UDP port 4370, one datagram per request and one per
//! reply. The socket is `connect`ed so only datagrams from the device are
//! delivered.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use punchsync_core::constants::{DEFAULT_SEND_TIMEOUT, MAX_DATAGRAM_SIZE};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// UDP transport for one device
pub struct UdpTransport {
    addr: String,
    port: u16,
    socket: Option<UdpSocket>,
    remote_addr: Option<SocketAddr>,
    send_timeout: Duration,
}

impl UdpTransport {
    /// Create new UDP transport
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            socket: None,
            remote_addr: None,
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT),
        }
    }

    /// Set send timeout
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Resolve address to SocketAddr
    async fn resolve_addr(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.remote_addr {
            return Ok(addr);
        }

        let addr_str = format!("{}:{}", self.addr, self.port);

        let addr = tokio::net::lookup_host(&addr_str)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr_str, e)))?
            .next()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", addr_str)))?;

        self.remote_addr = Some(addr);
        Ok(addr)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let remote = self.resolve_addr().await?;

        let local = if remote.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };

        let socket = UdpSocket::bind(local).await?;

        // Sets the default send target and filters incoming datagrams
        socket.connect(remote).await?;

        debug!(remote = %remote, local = ?socket.local_addr().ok(), "UDP channel open");

        self.socket = Some(socket);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            debug!(remote = %self.remote_addr(), "UDP channel closed");
        }

        self.remote_addr = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;

        trace!(len = data.len(), bytes = %hex::encode(data), "UDP send");

        timeout(self.send_timeout, socket.send(data))
            .await
            .map_err(|_| {
                warn!("Send timeout after {:?}", self.send_timeout);
                Error::WriteTimeout
            })??;

        Ok(())
    }

    async fn receive(&mut self, wait: Duration) -> Result<Bytes> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;

        let mut buf = BytesMut::zeroed(MAX_DATAGRAM_SIZE);

        let n = timeout(wait, socket.recv(&mut buf))
            .await
            .map_err(|_| Error::ReadTimeout)?
            .map_err(|e| {
                warn!("Read error: {}", e);
                Error::Io(e)
            })?;

        buf.truncate(n);

        trace!(len = n, bytes = %hex::encode(&buf), "UDP receive");

        Ok(buf.freeze())
    }

    fn remote_addr(&self) -> String {
        self.remote_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.addr, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn peer() -> (UdpSocket, u16) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    #[tokio::test]
    async fn test_udp_transport_create() {
        let transport = UdpTransport::new("192.168.1.201", 4370);
        assert!(!transport.is_connected());
        assert_eq!(transport.remote_addr(), "192.168.1.201:4370");
    }

    #[tokio::test]
    async fn test_udp_transport_invalid_address() {
        let mut transport = UdpTransport::new("invalid..address", 4370);

        let result = transport.connect().await;
        assert!(result.is_err());
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_send_requires_connect() {
        let mut transport = UdpTransport::new("127.0.0.1", 4370);

        assert!(matches!(transport.send(&[1, 2]).await, Err(Error::NotConnected)));
        assert!(matches!(
            transport.receive(Duration::from_millis(10)).await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_datagram_exchange() {
        let (device, port) = peer().await;
        let mut transport = UdpTransport::new("127.0.0.1", port);
        transport.connect().await.unwrap();
        assert!(matches!(transport.connect().await, Err(Error::AlreadyConnected)));

        transport.send(&[0xE8, 0x03, 0x17, 0xFC, 0, 0, 0, 0]).await.unwrap();

        let mut buf = [0u8; 64];
        let (n, from) = device.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0xE8, 0x03, 0x17, 0xFC, 0, 0, 0, 0]);

        device.send_to(&[0xD0, 0x07, 1, 2, 3, 4, 5, 6, 7], from).await.unwrap();

        let reply = transport.receive(Duration::from_secs(2)).await.unwrap();
        assert_eq!(reply.as_ref(), &[0xD0, 0x07, 1, 2, 3, 4, 5, 6, 7]);

        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_receive_timeout() {
        let (_device, port) = peer().await;
        let mut transport = UdpTransport::new("127.0.0.1", port);
        transport.connect().await.unwrap();

        let result = transport.receive(Duration::from_millis(50)).await;
        assert!(matches!(result, Err(Error::ReadTimeout)));
    }
}
