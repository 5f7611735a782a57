//! Device-to-collector sync pipeline
//!
//! connect → read (disable/read/enable) → upload in batches → optional
//! clear → disconnect. Once connected, the session is disconnected on every
//! exit path.

use punchsync_types::SyncResult;
use punchsync_upload::{BatchUploader, RecordTransport};
use tracing::{info, warn};

use crate::{device::DeviceSession, error::Result, reader::AttendanceReader};

/// Pipeline switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Erase the device log after a fully successful upload
    pub clear_after_sync: bool,
}

/// What a sync run did
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub records_read: usize,

    /// Upload outcome; `None` when the device had no records
    pub upload: Option<SyncResult>,

    /// Whether the device log was cleared
    pub cleared: bool,
}

impl SyncReport {
    /// Nothing read, or everything read was delivered
    pub fn is_success(&self) -> bool {
        self.upload.as_ref().is_none_or(|upload| upload.success)
    }
}

/// Run one sync
///
/// # Errors
///
/// Returns an error if the device cannot be connected or the read fails.
/// Upload failures are reported in [`SyncReport::upload`], and a failed clear
/// leaves [`SyncReport::cleared`] false; neither is an error.
pub async fn run<T>(
    device: &mut DeviceSession,
    uploader: &BatchUploader,
    transport: &T,
    options: SyncOptions,
) -> Result<SyncReport>
where
    T: RecordTransport + ?Sized,
{
    device.connect().await?;

    let outcome = transfer(device, uploader, transport, options).await;
    device.disconnect().await;

    outcome
}

async fn transfer<T>(
    device: &mut DeviceSession,
    uploader: &BatchUploader,
    transport: &T,
    options: SyncOptions,
) -> Result<SyncReport>
where
    T: RecordTransport + ?Sized,
{
    let records = AttendanceReader::new(device).get_attendance().await?;

    if records.is_empty() {
        info!("No attendance records to sync");
        return Ok(SyncReport {
            records_read: 0,
            upload: None,
            cleared: false,
        });
    }

    let upload = uploader.send_in_batches(&records, transport).await;

    let cleared = if !options.clear_after_sync {
        false
    } else if upload.success {
        match AttendanceReader::new(device).clear_attendance().await {
            Ok(cleared) => cleared,
            Err(e) => {
                warn!(error = %e, "Records delivered but device log could not be cleared");
                false
            }
        }
    } else {
        warn!(failed = upload.failed, "Upload incomplete, device log left intact");
        false
    };

    Ok(SyncReport {
        records_read: records.len(),
        upload: Some(upload),
        cleared,
    })
}
