use std::sync::Arc;

use netventory_rules::DeviceProfileTable;
use netventory_types::{Device, DeviceType};

/// Heuristic device-type classifier over open ports and OS/hostname text.
#[derive(Debug, Clone)]
pub struct DeviceClassifier {
    profiles: Arc<DeviceProfileTable>,
}

impl DeviceClassifier {
    pub fn new(profiles: Arc<DeviceProfileTable>) -> Self {
        Self { profiles }
    }

    /// Score every profile and pick the best match.
    ///
    /// Each profile port present on the device scores 2; each keyword scores
    /// 3 against the OS description and 2 against the hostname. The first
    /// profile (in catalog order) reaching the maximum wins; a device
    /// matching nothing classifies as `Unknown`.
    pub fn classify(&self, device: &Device) -> DeviceType {
        let os = device.os.to_lowercase();
        let hostname = device.hostname.to_lowercase();

        let mut best = DeviceType::Unknown;
        let mut best_score = 0u32;

        for profile in self.profiles.iter() {
            let mut score = 0u32;

            for port in profile.ports {
                if device.services.contains_key(port) {
                    score += 2;
                }
            }
            for keyword in profile.keywords {
                if os.contains(keyword) {
                    score += 3;
                }
                if hostname.contains(keyword) {
                    score += 2;
                }
            }

            if score > best_score {
                best_score = score;
                best = profile.device_type;
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netventory_types::Service;

    fn classifier() -> DeviceClassifier {
        DeviceClassifier::new(Arc::new(DeviceProfileTable::new()))
    }

    fn device(ports: &[u16], os: &str, hostname: &str) -> Device {
        let mut d = Device::new("10.0.0.1");
        d.os = os.to_string();
        d.hostname = hostname.to_string();
        for &port in ports {
            d.services.insert(port, Service::new(port, "tcp", "svc"));
        }
        d
    }

    #[test]
    fn nothing_matches_is_unknown() {
        let c = classifier();
        assert_eq!(c.classify(&device(&[], "", "")), DeviceType::Unknown);
        assert_eq!(
            c.classify(&device(&[9999], "SomeOS", "host-1")),
            DeviceType::Unknown
        );
    }

    #[test]
    fn printer_by_ports_and_keyword() {
        let c = classifier();
        let d = device(&[515, 631, 9100], "", "hp-laserjet");
        assert_eq!(c.classify(&d), DeviceType::Printer);
    }

    #[test]
    fn os_keyword_outweighs_single_port() {
        let c = classifier();
        // One server port (2) vs. a router OS keyword (3)
        let d = device(&[22], "MikroTik RouterOS", "");
        assert_eq!(c.classify(&d), DeviceType::Router);
    }

    #[test]
    fn tie_resolves_to_catalog_order() {
        let c = classifier();
        // Port 161 scores 2 for router and 2 for switch; router comes first
        let d = device(&[161], "", "");
        assert_eq!(c.classify(&d), DeviceType::Router);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = classifier();
        let d = device(&[135, 139, 445], "Microsoft Windows 10", "alice-desktop");
        let first = c.classify(&d);
        for _ in 0..10 {
            assert_eq!(c.classify(&d), first);
        }
        assert_eq!(first, DeviceType::Workstation);
    }
}
