//! HTTP collector client
//!
//! One POST per chunk:
//!
//! ```text
//! POST {base}            (EndpointLayout::Root)
//! POST {base}/attendance (EndpointLayout::PathBased)
//! Authorization: Bearer {api_key}
//! Accept: application/json
//! Content-Type: application/json
//!
//! {"records": [...], "device_info": {"ip": ..., "port": ..., "synced_at": ...}}
//! ```
//!
//! Only a 2xx status counts as delivered.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, SecondsFormat};
use punchsync_types::{AttendanceRecord, BatchResult, DeviceInfo};
use reqwest::{header::ACCEPT, Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    error::{Error, Result},
    transport::RecordTransport,
};

/// Timeout for the reachability check
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the collector expects uploads and health checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointLayout {
    /// Upload and health check both hit the base URL
    #[default]
    Root,

    /// `{base}/attendance` for uploads, `{base}/health` for health checks
    PathBased,
}

impl EndpointLayout {
    fn upload_url(self, base: &str) -> String {
        match self {
            Self::Root => base.to_string(),
            Self::PathBased => format!("{}/attendance", base),
        }
    }

    fn health_url(self, base: &str) -> String {
        match self {
            Self::Root => base.to_string(),
            Self::PathBased => format!("{}/health", base),
        }
    }
}

/// Collector connection settings
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub layout: EndpointLayout,

    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

impl HttpTransportConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            layout: EndpointLayout::default(),
            accept_invalid_certs: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_layout(mut self, layout: EndpointLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

#[derive(Serialize)]
struct UploadBody<'a> {
    records: &'a [AttendanceRecord],
    device_info: DeviceBody<'a>,
}

#[derive(Serialize)]
struct DeviceBody<'a> {
    #[serde(flatten)]
    device: &'a DeviceInfo,
    synced_at: String,
}

/// [`RecordTransport`] posting JSON to a remote collector
pub struct HttpRecordTransport {
    client: Client,
    base_url: String,
    api_key: String,
    layout: EndpointLayout,
    device: DeviceInfo,
}

impl HttpRecordTransport {
    /// Build the client
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if the base URL is empty or not http(s)
    /// - [`Error::Http`] if the HTTP client cannot be built
    pub fn new(config: HttpTransportConfig, device: DeviceInfo) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::InvalidConfig("Remote API URL is not configured".into()));
        }

        let parsed = Url::parse(&base_url)
            .map_err(|e| Error::InvalidConfig(format!("Invalid remote API URL {}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "Remote API URL must be http or https: {}",
                base_url
            )));
        }

        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for {}", base_url);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            layout: config.layout,
            device,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the collector is reachable
    pub async fn test_connection(&self) -> bool {
        let url = self.layout.health_url(&self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                info!("Remote API connection test successful");
                true
            }
            Ok(response) => {
                warn!(status = response.status().as_u16(), "Remote API connection test failed");
                false
            }
            Err(e) => {
                error!(error = %e, "Remote API connection test failed");
                false
            }
        }
    }

    /// Ask the collector what it last received from this device
    ///
    /// Returns `None` on any failure.
    pub async fn sync_status(&self) -> Option<Value> {
        let url = format!("{}/attendance/sync-status", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .query(&[("device_ip", self.device.ip.as_str())])
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => match response.json().await {
                Ok(status) => Some(status),
                Err(e) => {
                    warn!(error = %e, "Sync status response is not JSON");
                    None
                }
            },
            Ok(response) => {
                debug!(status = response.status().as_u16(), "Sync status unavailable");
                None
            }
            Err(e) => {
                error!(error = %e, "Error getting sync status");
                None
            }
        }
    }
}

#[async_trait]
impl RecordTransport for HttpRecordTransport {
    async fn send_one(&self, records: &[AttendanceRecord]) -> BatchResult {
        if records.is_empty() {
            return BatchResult::empty();
        }

        let count = records.len();
        let body = UploadBody {
            records,
            device_info: DeviceBody {
                device: &self.device,
                synced_at: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            },
        };

        info!(count, "Sending attendance records to remote server");

        let response = match self
            .client
            .post(self.layout.upload_url(&self.base_url))
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Request to remote server failed");
                return BatchResult::transport_error(count, e.to_string());
            }
        };

        let status = response.status();

        if status.is_success() {
            let data: Option<Value> = response.json().await.ok();
            let message = data
                .as_ref()
                .and_then(|d| d.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("Records sent successfully")
                .to_string();

            info!(count, "Successfully sent attendance records");
            BatchResult::delivered(count, message, data)
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Failed to send attendance records");
            BatchResult::rejected(count, status.as_u16(), body)
        }
    }
}
