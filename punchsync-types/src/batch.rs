//! Upload outcome accounting

use serde::Serialize;
use serde_json::Value;

/// Why a chunk was not delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Collector answered with a non-success HTTP status
    Status(u16),

    /// Request never produced a response (connect error, timeout, ...)
    Transport,
}

impl FailureKind {
    /// Check if sending the same chunk again might succeed
    pub fn is_retriable(self) -> bool {
        match self {
            Self::Transport => true,
            Self::Status(status) => status == 408 || status == 429 || status >= 500,
        }
    }
}

/// Outcome of sending one chunk
///
/// A chunk is delivered or failed as a whole: `sent` and `failed` are never
/// both non-zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub success: bool,
    pub sent: usize,
    pub failed: usize,
    pub message: String,

    /// Diagnostic detail (response body or transport error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Parsed collector response body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,

    #[serde(skip)]
    pub failure: Option<FailureKind>,

    /// Number of send attempts made for this chunk
    pub attempts: u32,
}

impl BatchResult {
    /// Nothing to send; no request was made
    pub fn empty() -> Self {
        Self {
            success: false,
            sent: 0,
            failed: 0,
            message: "No records to send".into(),
            error: None,
            response: None,
            failure: None,
            attempts: 0,
        }
    }

    /// Whole chunk accepted by the collector
    pub fn delivered(count: usize, message: impl Into<String>, response: Option<Value>) -> Self {
        Self {
            success: true,
            sent: count,
            failed: 0,
            message: message.into(),
            error: None,
            response,
            failure: None,
            attempts: 1,
        }
    }

    /// Collector answered with a non-success status
    pub fn rejected(count: usize, status: u16, body: impl Into<String>) -> Self {
        Self {
            success: false,
            sent: 0,
            failed: count,
            message: format!("Failed to send records: {}", status),
            error: Some(body.into()),
            response: None,
            failure: Some(FailureKind::Status(status)),
            attempts: 1,
        }
    }

    /// Request failed before a response arrived
    pub fn transport_error(count: usize, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            sent: 0,
            failed: count,
            message: format!("Request failed: {}", error),
            error: Some(error),
            response: None,
            failure: Some(FailureKind::Transport),
            attempts: 1,
        }
    }

    /// Check if the failure is worth retrying
    pub fn is_retriable(&self) -> bool {
        self.failure.is_some_and(FailureKind::is_retriable)
    }
}

/// Aggregate outcome of a batched upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncResult {
    pub success: bool,
    pub message: String,
    pub total_records: usize,
    pub sent: usize,
    pub failed: usize,
    pub batch_count: usize,

    /// One entry per chunk, in send order
    pub batches: Vec<BatchResult>,
}

impl SyncResult {
    /// Fold per-chunk outcomes into totals
    pub fn from_batches(total_records: usize, batches: Vec<BatchResult>) -> Self {
        let sent: usize = batches.iter().map(|b| b.sent).sum();
        let failed: usize = batches.iter().map(|b| b.failed).sum();

        Self {
            success: failed == 0,
            message: format!("Sent {} records, {} failed", sent, failed),
            total_records,
            sent,
            failed,
            batch_count: batches.len(),
            batches,
        }
    }
}
