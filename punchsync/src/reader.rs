//! Attendance log reader
//!
//! Bulk reads are bracketed by DISABLE_DEVICE / ENABLE_DEVICE so nobody can
//! edit the terminal while its log is being pulled. The terminal is
//! re-enabled exactly once on every path out of a read, otherwise staff are
//! locked out of it.

use punchsync_core::{decode_attendance_reply, Command, Reply};
use punchsync_types::AttendanceRecord;
use tracing::{debug, info, warn};

use crate::{
    device::DeviceSession,
    error::{Error, Result},
};

/// Reads and clears the attendance log of a connected device
pub struct AttendanceReader<'a> {
    device: &'a mut DeviceSession,
}

impl<'a> AttendanceReader<'a> {
    pub fn new(device: &'a mut DeviceSession) -> Self {
        Self { device }
    }

    /// Pull every stored punch
    ///
    /// Returns an empty list when the device does not answer the request.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] without a live session (nothing is sent)
    /// - any other send failure, or an error code in the reply, after the
    ///   device has been re-enabled
    pub async fn get_attendance(&mut self) -> Result<Vec<AttendanceRecord>> {
        let reply = match self.bracketed(Command::GetAttendance).await? {
            Some(reply) => reply,
            None => {
                warn!(device = %self.device.address(), "No reply to attendance request");
                return Ok(Vec::new());
            }
        };

        if reply.is_error() {
            return Err(Error::Rejected {
                command: Command::GetAttendance,
                code: reply.code(),
            });
        }

        let records = decode_attendance_reply(reply.as_bytes());
        info!(
            device = %self.device.address(),
            count = records.len(),
            "Read attendance records"
        );

        Ok(records)
    }

    /// Erase the attendance log
    ///
    /// Returns `true` if the device answered at all. The protocol has no
    /// stronger acknowledgement that records were actually erased.
    pub async fn clear_attendance(&mut self) -> Result<bool> {
        match self.bracketed(Command::ClearAttendance).await? {
            Some(reply) => {
                if reply.is_error() {
                    warn!(code = reply.code(), "Device answered clear request with an error code");
                }
                info!(device = %self.device.address(), "Attendance log cleared");
                Ok(true)
            }
            None => {
                warn!(device = %self.device.address(), "No reply to clear request");
                Ok(false)
            }
        }
    }

    /// Disable, run `command`, re-enable
    ///
    /// `Ok(None)` means the command timed out.
    async fn bracketed(&mut self, command: Command) -> Result<Option<Reply>> {
        self.device.ensure_connected()?;

        if let Err(e) = self.device.disable_device().await {
            warn!(error = %e, "Could not disable device, continuing");
        }

        debug!(command = %command, "Sending bulk command");
        let outcome = self.device.send_command(command, &[]).await;

        if let Err(e) = self.device.enable_device().await {
            warn!(error = %e, "Failed to re-enable device");
        }

        match outcome {
            Ok(reply) => Ok(Some(reply)),
            Err(e) if e.is_timeout() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
