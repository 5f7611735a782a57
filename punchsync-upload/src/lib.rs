//! # punchsync-upload
//!
//! Delivers attendance records to a remote collector in fixed-size chunks.
//!
//! - [`RecordTransport`]: sends one chunk and reports a [`BatchResult`]
//! - [`BatchUploader`]: chunking, pacing, optional retries and accounting
//! - [`HttpRecordTransport`]: the JSON-over-HTTPS collector client
//!
//! [`BatchResult`]: punchsync_types::BatchResult

pub mod batch;
pub mod error;
pub mod http;
pub mod transport;

pub use batch::{BatchUploader, RetryPolicy, DEFAULT_BATCH_SIZE, DEFAULT_PACING};
pub use error::{Error, Result};
pub use http::{EndpointLayout, HttpRecordTransport, HttpTransportConfig};
pub use transport::RecordTransport;
