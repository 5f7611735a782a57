//! Device metadata sent alongside uploaded records

use std::fmt;

use serde::Serialize;

/// Identifies the terminal a batch of records came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Device IP address or hostname
    pub ip: String,

    /// Device UDP port
    pub port: u16,

    /// Optional site label (user-assigned)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DeviceInfo {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Device[{} @ {}:{}]", name, self.ip, self.port),
            None => write!(f, "Device[{}:{}]", self.ip, self.port),
        }
    }
}
