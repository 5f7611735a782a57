//! Batched delivery
//!
//! Records are split into ordered chunks and sent one at a time. A failed
//! chunk never stops the run; its records are counted as failed and the next
//! chunk goes out after the pacing delay.

use std::time::Duration;

use punchsync_types::{AttendanceRecord, BatchResult, SyncResult};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{
    error::{Error, Result},
    transport::RecordTransport,
};

/// Default number of records per chunk
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default delay between consecutive chunks
pub const DEFAULT_PACING: Duration = Duration::from_millis(500);

/// Per-chunk retry policy
///
/// Only retriable failures are retried (transport errors, HTTP 408, 429 and
/// 5xx). The wait before retry `n` is `initial_backoff * 2^(n-1)`, capped at
/// `max_backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Retry up to `max_retries` times with the default backoff
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }

    /// Never retry
    pub fn none() -> Self {
        Self::new(0)
    }

    /// Delay before the given retry (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);

        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Sends records in fixed-size chunks through a [`RecordTransport`]
#[derive(Debug, Clone)]
pub struct BatchUploader {
    batch_size: usize,
    pacing: Duration,
    retry: RetryPolicy,
}

impl BatchUploader {
    /// Create an uploader with the default pacing and no retries
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBatchSize`] if `batch_size` is zero.
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidBatchSize);
        }

        Ok(Self {
            batch_size,
            pacing: DEFAULT_PACING,
            retry: RetryPolicy::none(),
        })
    }

    /// Set the delay between consecutive chunks
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Deliver `records` chunk by chunk, in order
    ///
    /// Every chunk is attempted regardless of earlier failures. The result
    /// keeps one [`BatchResult`] per chunk in send order.
    pub async fn send_in_batches<T>(&self, records: &[AttendanceRecord], transport: &T) -> SyncResult
    where
        T: RecordTransport + ?Sized,
    {
        let total = records.len();
        let batch_count = total.div_ceil(self.batch_size);

        info!(total, batches = batch_count, "Sending records in batches");

        let mut results = Vec::with_capacity(batch_count);

        for (index, chunk) in records.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                sleep(self.pacing).await;
            }

            info!(batch = index + 1, of = batch_count, size = chunk.len(), "Sending batch");

            let result = self.send_chunk(chunk, transport).await;
            if !result.success {
                error!(
                    batch = index + 1,
                    failed = result.failed,
                    error = result.error.as_deref().unwrap_or_default(),
                    "{}",
                    result.message
                );
            }

            results.push(result);
        }

        let summary = SyncResult::from_batches(total, results);
        info!(sent = summary.sent, failed = summary.failed, "{}", summary.message);

        summary
    }

    async fn send_chunk<T>(&self, chunk: &[AttendanceRecord], transport: &T) -> BatchResult
    where
        T: RecordTransport + ?Sized,
    {
        let mut attempts = 1;
        let mut result = transport.send_one(chunk).await;

        while !result.success && result.is_retriable() && attempts <= self.retry.max_retries {
            let backoff = self.retry.backoff(attempts);
            warn!(
                attempt = attempts,
                backoff = ?backoff,
                "{}, retrying",
                result.message
            );

            sleep(backoff).await;
            attempts += 1;
            result = transport.send_one(chunk).await;
        }

        result.attempts = attempts;
        result
    }
}

impl Default for BatchUploader {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            pacing: DEFAULT_PACING,
            retry: RetryPolicy::none(),
        }
    }
}
