//! # punchsync
//!
//! Pull attendance punches from ZKTeco time-clock terminals and push them to
//! a remote collector.
//!
//! ## Features
//!
//! - Async UDP protocol client with reply correlation
//! - Attendance reads that always leave the terminal enabled
//! - Batched uploads with exact per-chunk accounting
//!
//! ## Quick Start
//!
//! ```no_run
//! use punchsync::{AttendanceReader, DeviceSession};
//!
//! #[tokio::main]
//! async fn main() -> punchsync::Result<()> {
//!     let mut device = DeviceSession::new("192.168.1.201", 4370);
//!     device.connect().await?;
//!
//!     let records = AttendanceReader::new(&mut device).get_attendance().await?;
//!     for record in &records {
//!         println!("{}", record);
//!     }
//!
//!     device.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;
pub mod reader;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use device::DeviceSession;
pub use error::{Error, Result};
pub use reader::AttendanceReader;
pub use sync::{SyncOptions, SyncReport};

// Re-export types
pub use punchsync_core::{Command, Reply, Session, SessionState, DEFAULT_PORT};
pub use punchsync_types::{AttendanceRecord, BatchResult, DeviceInfo, SyncResult};
pub use punchsync_upload::{BatchUploader, HttpRecordTransport, RecordTransport, RetryPolicy};
