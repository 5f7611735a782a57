//! Type definitions for punchsync

pub mod batch;
pub mod device_info;
pub mod record;

pub use batch::{BatchResult, FailureKind, SyncResult};
pub use device_info::DeviceInfo;
pub use record::{AttendanceRecord, PunchStatus, VerifyType};
