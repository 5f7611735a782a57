//! Record transport abstraction

use async_trait::async_trait;
use punchsync_types::{AttendanceRecord, BatchResult};

/// Sends one chunk of records to a collector
///
/// Implementations never fail: every outcome, including network errors, is
/// folded into the returned [`BatchResult`]. A chunk is delivered or failed
/// as a whole.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordTransport: Send + Sync {
    async fn send_one(&self, records: &[AttendanceRecord]) -> BatchResult;
}
