//! High-level device session

use std::time::Duration;

use bytes::Bytes;
use punchsync_core::{constants::DEFAULT_READ_TIMEOUT, Command, CommandFrame, Reply, Session};
use punchsync_transport::{Transport, UdpTransport};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};

/// Protocol session with one time-clock terminal
///
/// Owns the transport and the session counters. Every operation takes
/// `&mut self`, so at most one command is ever in flight.
///
/// # Examples
///
/// ```no_run
/// use punchsync::DeviceSession;
///
/// #[tokio::main]
/// async fn main() -> punchsync::Result<()> {
///     let mut device = DeviceSession::new("192.168.1.201", 4370);
///
///     device.connect().await?;
///     device.disable_device().await?;
///     device.enable_device().await?;
///     device.disconnect().await;
///
///     Ok(())
/// }
/// ```
pub struct DeviceSession {
    transport: Box<dyn Transport>,
    session: Session,
    timeout: Duration,
}

impl DeviceSession {
    /// Create a session over UDP with the default 10 s timeouts
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self::udp(ip, port, Duration::from_secs(DEFAULT_READ_TIMEOUT))
    }

    /// Create a session over UDP using `timeout` for both send and receive
    pub fn udp(ip: impl Into<String>, port: u16, timeout: Duration) -> Self {
        let ip = ip.into();
        let address = format!("{}:{}", ip, port);
        let transport = UdpTransport::new(ip, port).with_send_timeout(timeout);

        Self::with_transport(address, Box::new(transport)).with_timeout(timeout)
    }

    /// Create a session over any transport
    pub fn with_transport(address: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            session: Session::new(address),
            timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT),
        }
    }

    /// Set receive timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        self.session.device_address()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.session.is_connected() && self.transport.is_connected()
    }

    /// Open the channel and perform the CONNECT handshake
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No device address is configured
    /// - The session is already connected
    /// - The channel cannot be opened or the send fails
    /// - The device does not answer before the receive timeout
    /// - The device answers with an error code
    ///
    /// On any error the channel is closed and the session stays disconnected.
    pub async fn connect(&mut self) -> Result<()> {
        if self.host().is_empty() {
            return Err(Error::Config("Device address is not configured".into()));
        }
        if self.session.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        info!(device = %self.address(), "Connecting");

        // Clears anything left behind by an abandoned handshake
        self.session.close();
        self.session.begin_connect()?;

        match self.handshake().await {
            Ok(session_id) => {
                self.session.establish(session_id)?;
                info!(
                    device = %self.address(),
                    session_id = format!("0x{:04X}", session_id),
                    "Connected"
                );
                Ok(())
            }
            Err(e) => {
                warn!(device = %self.address(), error = %e, "Connect failed");
                self.reset().await;
                Err(e)
            }
        }
    }

    async fn handshake(&mut self) -> Result<u16> {
        self.transport.connect().await?;

        let reply = self.exchange(Command::Connect, Bytes::new()).await?;
        if reply.is_error() {
            return Err(Error::Rejected {
                command: Command::Connect,
                code: reply.code(),
            });
        }

        Ok(reply.session_id())
    }

    /// Send EXIT (best effort) and close the channel
    ///
    /// Always ends disconnected. Failures are logged, never returned.
    pub async fn disconnect(&mut self) {
        if self.session.is_connected() {
            info!(device = %self.address(), "Disconnecting");

            let frame = self.next_frame(Command::Exit, Bytes::new());
            if let Err(e) = self.transport.send(&frame.encode()).await {
                warn!(error = %e, "Failed to send EXIT command");
            }
        }

        self.reset().await;
        debug!(device = %self.address(), "Disconnected");
    }

    /// Send a command and wait for its reply
    ///
    /// The reply id advances once per frame sent. Replies carrying another
    /// reply id are discarded while waiting.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] without a live session
    /// - [`Error::Timeout`] if no matching reply arrives in time
    /// - [`Error::Transport`] if the send fails; a fatal transport error
    ///   also resets the session
    pub async fn send_command(&mut self, command: Command, payload: &[u8]) -> Result<Reply> {
        self.ensure_connected()?;
        self.session.begin_command()?;

        let result = self
            .exchange(command, Bytes::copy_from_slice(payload))
            .await;

        match &result {
            Err(Error::Transport(e)) if e.is_fatal() => {
                warn!(command = %command, error = %e, "Session lost");
                self.reset().await;
            }
            _ => self.session.finish_command(),
        }

        result
    }

    /// Enable device (normal operation mode)
    pub async fn enable_device(&mut self) -> Result<()> {
        debug!("Enabling device");
        let reply = self.send_command(Command::EnableDevice, &[]).await?;
        Self::expect_ack(Command::EnableDevice, &reply)
    }

    /// Disable device (terminal shows "Working..." and ignores the keypad)
    pub async fn disable_device(&mut self) -> Result<()> {
        debug!("Disabling device");
        let reply = self.send_command(Command::DisableDevice, &[]).await?;
        Self::expect_ack(Command::DisableDevice, &reply)
    }

    // Helper methods

    pub(crate) fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    fn host(&self) -> &str {
        let address = self.address();
        address
            .rsplit_once(':')
            .map_or(address, |(host, _)| host)
            .trim()
    }

    fn expect_ack(command: Command, reply: &Reply) -> Result<()> {
        if reply.is_error() {
            return Err(Error::Rejected {
                command,
                code: reply.code(),
            });
        }
        Ok(())
    }

    fn next_frame(&mut self, command: Command, payload: Bytes) -> CommandFrame {
        let reply_id = self.session.next_reply_id();
        CommandFrame::new(command, self.session.session_id(), reply_id, payload)
    }

    async fn exchange(&mut self, command: Command, payload: Bytes) -> Result<Reply> {
        let frame = self.next_frame(command, payload);
        trace!("Sending: {:?}", frame);

        self.transport.send(&frame.encode()).await?;
        self.await_reply(command, frame.reply_id()).await
    }

    async fn await_reply(&mut self, command: Command, reply_id: u16) -> Result<Reply> {
        let after = self.timeout;
        let deadline = Instant::now() + after;
        let timed_out = || Error::Timeout { command, after };

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timed_out());
            }

            let datagram = match self.transport.receive(remaining).await {
                Ok(datagram) => datagram,
                Err(e) if e.is_timeout() => return Err(timed_out()),
                Err(e) => return Err(e.into()),
            };

            let reply = match Reply::parse(datagram) {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(command = %command, error = %e, "Discarding malformed datagram");
                    continue;
                }
            };

            if reply.reply_id() != reply_id {
                warn!(
                    command = %command,
                    expected = reply_id,
                    got = reply.reply_id(),
                    "Discarding stale reply"
                );
                continue;
            }

            if !reply.checksum_valid() {
                warn!(command = %command, "Reply checksum mismatch");
            }

            trace!("Received: {:?}", reply);
            return Ok(reply);
        }
    }

    async fn reset(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            warn!(error = %e, "Failed to close transport");
        }
        self.session.close();
    }
}
