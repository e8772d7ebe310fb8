use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::risk::{Severity, Vulnerability};
use crate::service::Service;

/// Hardware facts for a device.
///
/// Populated by the SNMP enrichment collaborator; the scanner itself only
/// attaches an empty placeholder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HardwareInfo {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cpu: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub memory: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<String>,
}

/// One discovered network host with its detected services and risk fields.
///
/// Created by the scan engine from one host's parsed scanner output, then
/// augmented once with audit results before emission. Not mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Dotted-quad address (or the raw target string when no address was
    /// reported). Never empty.
    pub address: String,
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    /// OS description from fingerprinting, "unknown" when none was reported.
    pub os: String,
    /// Open services keyed by port.
    pub services: BTreeMap<u16, Service>,
    #[serde(default, skip_serializing_if = "hardware_is_empty")]
    pub hardware: HardwareInfo,
    /// Wall-clock seconds the host's scan took.
    pub scan_duration: f64,
    pub last_seen: DateTime<Utc>,
    /// Overall severity bucket; `None` when the audit did not run or failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<Severity>,
    /// Summed severity weight from the security audit.
    #[serde(default)]
    pub risk_score: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

fn hardware_is_empty(hw: &HardwareInfo) -> bool {
    hw.cpu.is_empty() && hw.memory.is_empty() && hw.storage.is_empty()
        && hw.network_interfaces.is_empty()
}

impl Device {
    /// Create a device with defaults for everything but its address.
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            hostname: address.clone(),
            address,
            mac: None,
            vendor: None,
            os: "unknown".to_string(),
            services: BTreeMap::new(),
            hardware: HardwareInfo::default(),
            scan_duration: 0.0,
            last_seen: Utc::now(),
            risk_level: None,
            risk_score: 0,
            vulnerabilities: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    pub fn open_port_count(&self) -> usize {
        self.services.len()
    }

    /// Numeric sort key: IPv4 octets compared left to right.
    ///
    /// Non-IPv4 addresses order after all IPv4 addresses, among themselves
    /// lexicographically.
    pub fn address_sort_key(&self) -> (u8, u32, String) {
        match self.address.parse::<std::net::Ipv4Addr>() {
            Ok(ip) => (0, u32::from(ip), String::new()),
            Err(_) => (1, 0, self.address.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_device_defaults() {
        let d = Device::new("10.0.0.1");
        assert_eq!(d.address, "10.0.0.1");
        assert_eq!(d.hostname, "10.0.0.1");
        assert_eq!(d.os, "unknown");
        assert!(d.mac.is_none());
        assert!(d.services.is_empty());
        assert!(d.risk_level.is_none());
        assert_eq!(d.risk_score, 0);
    }

    #[test]
    fn address_sort_key_numeric_octets() {
        let a = Device::new("10.0.0.2");
        let b = Device::new("10.0.0.10");
        // Numeric, not lexicographic: .2 sorts before .10
        assert!(a.address_sort_key() < b.address_sort_key());

        let c = Device::new("9.255.255.255");
        assert!(c.address_sort_key() < a.address_sort_key());
    }

    #[test]
    fn address_sort_key_non_ipv4_after_ipv4() {
        let ip = Device::new("192.168.1.1");
        let name = Device::new("printer.lan");
        assert!(ip.address_sort_key() < name.address_sort_key());
    }

    #[test]
    fn device_json_skips_empty_risk_fields() {
        let d = Device::new("10.0.0.1");
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("vulnerabilities"));
        assert!(!json.contains("risk_level"));
        assert!(!json.contains("hardware"));
        // risk_score is always present so consumers need no default handling
        assert!(json.contains("\"risk_score\":0"));
    }
}
