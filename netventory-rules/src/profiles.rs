use netventory_types::DeviceType;

/// Classification profile for one device category.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub device_type: DeviceType,
    /// Well-known ports typical for the category.
    pub ports: &'static [u16],
    /// Keywords looked for in the OS description and hostname.
    pub keywords: &'static [&'static str],
}

/// Ordered catalog of classification profiles.
///
/// Order matters: classification ties resolve to the first profile reaching
/// the maximum score.
#[derive(Debug, Clone)]
pub struct DeviceProfileTable {
    profiles: Vec<DeviceProfile>,
}

impl DeviceProfileTable {
    pub fn new() -> Self {
        let profiles = vec![
            DeviceProfile {
                device_type: DeviceType::Router,
                // DNS, DHCP, SNMP
                ports: &[53, 67, 68, 161],
                keywords: &["router", "gateway", "mikrotik", "cisco"],
            },
            DeviceProfile {
                device_type: DeviceType::Switch,
                // SNMP
                ports: &[161, 162],
                keywords: &["switch", "catalyst", "procurve"],
            },
            DeviceProfile {
                device_type: DeviceType::Server,
                // FTP, SSH, HTTP(S), MySQL, MSSQL
                ports: &[21, 22, 80, 443, 3306, 1433],
                keywords: &["server", "windows server", "ubuntu server", "centos"],
            },
            DeviceProfile {
                device_type: DeviceType::Workstation,
                // NetBIOS, SMB
                ports: &[135, 139, 445],
                keywords: &["windows", "desktop", "workstation"],
            },
            DeviceProfile {
                device_type: DeviceType::Printer,
                // LPD, IPP, raw print
                ports: &[515, 631, 9100],
                keywords: &["printer", "hp", "epson", "canon"],
            },
            DeviceProfile {
                device_type: DeviceType::Camera,
                // RTSP, HTTP streams
                ports: &[554, 8000, 8080],
                keywords: &["camera", "ipcam", "axis", "hikvision"],
            },
        ];
        Self { profiles }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceProfile> {
        self.profiles.iter()
    }
}

impl Default for DeviceProfileTable {
    fn default() -> Self {
        Self::new()
    }
}
