use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a probed port as reported by the external scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
    #[default]
    Filtered,
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Filtered => write!(f, "filtered"),
        }
    }
}

/// One detected service on an open port.
///
/// Unique by `port` within a device; immutable once attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub port: u16,
    /// Transport protocol ("tcp" or "udp").
    pub protocol: String,
    pub state: PortState,
    /// Service name (e.g., "ssh", "http").
    pub name: String,
    /// Product name (e.g., "OpenSSH", "Apache"), when version probing saw one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// Version string (e.g., "8.9p1").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Service {
    pub fn new(port: u16, protocol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            port,
            protocol: protocol.into(),
            state: PortState::Open,
            name: name.into(),
            product: None,
            version: None,
        }
    }

    /// Format product + version for display, if either is present.
    pub fn version_display(&self) -> Option<String> {
        match (&self.product, &self.version) {
            (Some(p), Some(v)) => Some(format!("{p} {v}")),
            (Some(p), None) => Some(p.clone()),
            (None, Some(v)) => Some(v.clone()),
            (None, None) => None,
        }
    }
}
