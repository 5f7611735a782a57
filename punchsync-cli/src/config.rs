//! Configuration loading
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. TOML file (`--config`, or `./punchsync.toml` when present)
//! 3. environment variables
//! 4. command-line flags (applied by the caller)

use std::path::{Path, PathBuf};
use std::time::Duration;

use punchsync_types::DeviceInfo;
use punchsync_upload::{BatchUploader, EndpointLayout, HttpTransportConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "punchsync.toml";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub remote_api: RemoteApiConfig,
    pub sync: SyncConfig,
}

/// Terminal connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub ip: String,
    pub port: u16,
    /// Send and receive timeout in seconds.
    pub timeout_secs: u64,
    /// Optional site label sent with uploads.
    pub name: Option<String>,
}

/// Collector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteApiConfig {
    pub url: String,
    pub key: String,
    pub timeout_secs: u64,
    pub layout: EndpointLayout,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub batch_size: usize,
    /// Delay between chunks in milliseconds.
    pub pacing_ms: u64,
    pub auto_clear_device: bool,
    pub retry_failed: bool,
    pub max_retries: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ip: String::new(),
            port: punchsync::DEFAULT_PORT,
            timeout_secs: 10,
            name: None,
        }
    }
}

impl Default for RemoteApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: String::new(),
            timeout_secs: 30,
            layout: EndpointLayout::Root,
            accept_invalid_certs: false,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            pacing_ms: 500,
            auto_clear_device: false,
            retry_failed: true,
            max_retries: 3,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides.
    ///
    /// `lookup` resolves a variable name; pass `|k| std::env::var(k).ok()`
    /// for the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ZKTECO_DEVICE_IP") {
            self.device.ip = v;
        }
        if let Some(v) = lookup("ZKTECO_DEVICE_PORT") {
            self.device.port = parse_env("ZKTECO_DEVICE_PORT", v)?;
        }
        if let Some(v) = lookup("REMOTE_API_URL") {
            self.remote_api.url = v;
        }
        if let Some(v) = lookup("REMOTE_API_KEY") {
            self.remote_api.key = v;
        }
        if let Some(v) = lookup("REMOTE_API_TIMEOUT") {
            self.remote_api.timeout_secs = parse_env("REMOTE_API_TIMEOUT", v)?;
        }
        if let Some(v) = lookup("SYNC_BATCH_SIZE") {
            self.sync.batch_size = parse_env("SYNC_BATCH_SIZE", v)?;
        }
        if let Some(v) = lookup("AUTO_CLEAR_DEVICE") {
            self.sync.auto_clear_device = parse_bool("AUTO_CLEAR_DEVICE", v)?;
        }
        if let Some(v) = lookup("RETRY_FAILED_RECORDS") {
            self.sync.retry_failed = parse_bool("RETRY_FAILED_RECORDS", v)?;
        }
        if let Some(v) = lookup("MAX_RETRIES") {
            self.sync.max_retries = parse_env("MAX_RETRIES", v)?;
        }
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.ip.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Device IP is not configured (set [device] ip or ZKTECO_DEVICE_IP)".to_string(),
            ));
        }
        if self.device.port == 0 {
            return Err(ConfigError::Validation("Device port must be greater than 0".to_string()));
        }
        if self.device.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Device timeout must be at least 1 second".to_string(),
            ));
        }
        let url = self.remote_api.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Validation(
                "Remote API URL is not configured (set [remote_api] url or REMOTE_API_URL)"
                    .to_string(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "Remote API URL must start with http:// or https://".to_string(),
            ));
        }
        if self.remote_api.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Remote API timeout must be at least 1 second".to_string(),
            ));
        }
        if self.sync.batch_size == 0 {
            return Err(ConfigError::Validation("Batch size must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.device.timeout_secs)
    }

    pub fn device_info(&self) -> DeviceInfo {
        let info = DeviceInfo::new(self.device.ip.trim(), self.device.port);
        match &self.device.name {
            Some(name) => info.with_name(name),
            None => info,
        }
    }

    pub fn http_config(&self) -> HttpTransportConfig {
        HttpTransportConfig::new(self.remote_api.url.trim(), &self.remote_api.key)
            .with_timeout(Duration::from_secs(self.remote_api.timeout_secs))
            .with_layout(self.remote_api.layout)
            .with_accept_invalid_certs(self.remote_api.accept_invalid_certs)
    }

    pub fn uploader(&self) -> punchsync_upload::Result<BatchUploader> {
        let retry = if self.sync.retry_failed {
            RetryPolicy::new(self.sync.max_retries)
        } else {
            RetryPolicy::none()
        };

        Ok(BatchUploader::new(self.sync.batch_size)?
            .with_pacing(Duration::from_millis(self.sync.pacing_ms))
            .with_retry(retry))
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { name, value })
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Env { name, value }),
    }
}
