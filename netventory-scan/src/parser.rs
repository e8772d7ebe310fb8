// ---------------------------------------------------------------------------
// Scanner output parser
// ---------------------------------------------------------------------------
//
// Consumes one host's scanner output line by line and accumulates a Device.
// Lines are matched against the known patterns in a fixed order; the first
// match wins and anything unrecognized is ignored.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::Utc;
use netventory_types::{Device, PortState, Service};
use regex::Regex;
use tracing::debug;

static HOST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Nmap scan report for (\S+)(?: \(([0-9A-Fa-f:.]+)\))?\s*$").unwrap()
});
static MAC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^MAC Address: ([0-9A-Fa-f:]+) \((.+)\)\s*$").unwrap());
static OS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^OS details?: (.+)$").unwrap());
static SERVICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)/(tcp|udp)\s+(\S+)\s+(\S+)(?:\s+(.+))?$").unwrap());

/// Accumulates one host's scanner output into a [`Device`].
///
/// Every field starts at its default (identity = the input target, OS =
/// "unknown", no MAC, empty service map) and is overwritten as matching
/// lines arrive.
#[derive(Debug)]
pub struct OutputParser {
    address: String,
    hostname: String,
    mac: Option<String>,
    vendor: Option<String>,
    os: String,
    services: BTreeMap<u16, Service>,
}

impl OutputParser {
    /// Start parsing output for the given target host.
    pub fn new(target: &str) -> Self {
        Self {
            address: target.to_string(),
            hostname: target.to_string(),
            mac: None,
            vendor: None,
            os: "unknown".to_string(),
            services: BTreeMap::new(),
        }
    }

    /// Feed one output line into the accumulator.
    pub fn parse_line(&mut self, line: &str) {
        if let Some(caps) = HOST_RE.captures(line) {
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            self.hostname = name.to_string();
            match caps.get(2) {
                // "Nmap scan report for name (10.0.0.5)"
                Some(addr) => self.address = addr.as_str().to_string(),
                // "Nmap scan report for 10.0.0.5"
                None => self.address = name.to_string(),
            }
            return;
        }

        if let Some(caps) = MAC_RE.captures(line) {
            self.mac = Some(caps[1].to_string());
            self.vendor = Some(caps[2].to_string());
            return;
        }

        if let Some(caps) = OS_RE.captures(line) {
            self.os = caps[1].trim().to_string();
            return;
        }

        if let Some(caps) = SERVICE_RE.captures(line) {
            let Ok(port) = caps[1].parse::<u16>() else {
                debug!(line, "ignoring service line with out-of-range port");
                return;
            };
            // Only open services are recorded
            if &caps[3] != "open" {
                return;
            }

            let mut service = Service {
                port,
                protocol: caps[2].to_string(),
                state: PortState::Open,
                name: caps[4].to_string(),
                product: None,
                version: None,
            };
            if let Some(rest) = caps.get(5) {
                let mut tokens = rest.as_str().split_whitespace();
                service.product = tokens.next().map(str::to_string);
                service.version = tokens.next().map(str::to_string);
            }
            self.services.insert(port, service);
        }
    }

    /// Number of open services accumulated so far.
    pub fn open_ports(&self) -> usize {
        self.services.len()
    }

    /// Finish parsing and build the device record.
    pub fn into_device(self, scan_duration: f64) -> Device {
        Device {
            address: self.address,
            hostname: self.hostname,
            mac: self.mac,
            vendor: self.vendor,
            os: self.os,
            services: self.services,
            hardware: Default::default(),
            scan_duration,
            last_seen: Utc::now(),
            risk_level: None,
            risk_score: 0,
            vulnerabilities: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Starting Nmap 7.94 ( https://nmap.org )
Nmap scan report for printer.lan (192.168.1.42)
Host is up (0.0021s latency).
Not shown: 65530 closed tcp ports (reset)
PORT     STATE    SERVICE       VERSION
22/tcp   open     ssh           OpenSSH 8.9p1
80/tcp   open     http          nginx 1.20.2
443/tcp  closed   https
515/tcp  open     printer
9100/tcp filtered jetdirect
MAC Address: AA:BB:CC:DD:EE:FF (Hewlett Packard)
Device type: printer
OS details: HP embedded JetDirect
Nmap done: 1 IP address (1 host up) scanned in 12.41 seconds";

    fn parse(text: &str) -> OutputParser {
        let mut parser = OutputParser::new("192.168.1.42");
        for line in text.lines() {
            parser.parse_line(line);
        }
        parser
    }

    #[test]
    fn full_transcript() {
        let device = parse(SAMPLE).into_device(12.41);

        assert_eq!(device.address, "192.168.1.42");
        assert_eq!(device.hostname, "printer.lan");
        assert_eq!(device.mac.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(device.vendor.as_deref(), Some("Hewlett Packard"));
        assert_eq!(device.os, "HP embedded JetDirect");

        // closed and filtered ports are not recorded
        assert_eq!(device.services.len(), 3);
        assert!(device.services.contains_key(&22));
        assert!(device.services.contains_key(&80));
        assert!(device.services.contains_key(&515));
        assert!(!device.services.contains_key(&443));
        assert!(!device.services.contains_key(&9100));
    }

    #[test]
    fn product_and_version_split() {
        let parser = parse(SAMPLE);
        let device = parser.into_device(0.0);

        let ssh = &device.services[&22];
        assert_eq!(ssh.name, "ssh");
        assert_eq!(ssh.product.as_deref(), Some("OpenSSH"));
        assert_eq!(ssh.version.as_deref(), Some("8.9p1"));

        // no trailing text leaves product and version unset
        let lpd = &device.services[&515];
        assert!(lpd.product.is_none());
        assert!(lpd.version.is_none());
    }

    #[test]
    fn bare_address_report_line() {
        let mut parser = OutputParser::new("10.0.0.5");
        parser.parse_line("Nmap scan report for 10.0.0.5");
        let device = parser.into_device(0.0);
        assert_eq!(device.address, "10.0.0.5");
        assert_eq!(device.hostname, "10.0.0.5");
    }

    #[test]
    fn defaults_when_nothing_matches() {
        let mut parser = OutputParser::new("10.0.0.9");
        parser.parse_line("garbage line");
        parser.parse_line("");
        let device = parser.into_device(1.0);
        assert_eq!(device.address, "10.0.0.9");
        assert_eq!(device.hostname, "10.0.0.9");
        assert_eq!(device.os, "unknown");
        assert!(device.mac.is_none());
        assert!(device.services.is_empty());
    }

    #[test]
    fn state_must_be_exactly_open() {
        let mut parser = OutputParser::new("10.0.0.9");
        parser.parse_line("23/tcp open|filtered telnet");
        parser.parse_line("25/tcp Open smtp");
        assert_eq!(parser.open_ports(), 0);
    }

    #[test]
    fn later_service_line_replaces_earlier_port_entry() {
        let mut parser = OutputParser::new("10.0.0.9");
        parser.parse_line("80/tcp open http");
        parser.parse_line("80/tcp open http Apache 2.4.52");
        let device = parser.into_device(0.0);
        assert_eq!(device.services.len(), 1);
        assert_eq!(device.services[&80].product.as_deref(), Some("Apache"));
    }

    #[test]
    fn out_of_range_port_ignored() {
        let mut parser = OutputParser::new("10.0.0.9");
        parser.parse_line("70000/tcp open mystery");
        assert_eq!(parser.open_ports(), 0);
    }

    #[test]
    fn os_detail_singular_also_matches() {
        let mut parser = OutputParser::new("10.0.0.9");
        parser.parse_line("OS detail: Linux 5.15");
        let device = parser.into_device(0.0);
        assert_eq!(device.os, "Linux 5.15");
    }
}
