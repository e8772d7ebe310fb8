use std::net::{IpAddr, Ipv4Addr};

use ipnetwork::IpNetwork;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetParseError {
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
    #[error("invalid address range: {0}")]
    InvalidRange(String),
    #[error("empty target specification")]
    Empty,
}

/// Minimum CIDR prefix length allowed for IPv4. A /16 is 65k hosts, and each
/// host costs a full scanner process.
const MIN_IPV4_PREFIX: u8 = 16;
/// Minimum CIDR prefix length allowed for IPv6. A /120 contains 256 hosts.
const MIN_IPV6_PREFIX: u8 = 120;

/// Expand a target specification into a list of host strings.
///
/// Supports:
/// - Single IPv4/IPv6 addresses: `192.168.1.1`, `::1`
/// - CIDR notation: `192.168.1.0/24`
/// - Last-octet range: `192.168.1.1-100`
/// - Anything else passes through untouched as a single hostname target;
///   name resolution is left to the external scanner.
pub fn expand_targets(input: &str) -> Result<Vec<String>, TargetParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TargetParseError::Empty);
    }

    if input.contains('/') {
        return expand_cidr(input);
    }

    if input.contains('-') && input.contains('.') {
        return expand_octet_range(input);
    }

    if input.parse::<IpAddr>().is_ok() {
        return Ok(vec![input.to_string()]);
    }

    // Hostname: a single target, resolved by the scanner itself
    Ok(vec![input.to_string()])
}

/// Expand CIDR notation like `192.168.1.0/24` into host strings.
fn expand_cidr(input: &str) -> Result<Vec<String>, TargetParseError> {
    let network: IpNetwork = input
        .parse()
        .map_err(|e| TargetParseError::InvalidCidr(format!("{input}: {e}")))?;

    // Reject ranges that would spawn an unreasonable number of processes
    let prefix = network.prefix();
    let (min_prefix, family) = match network {
        IpNetwork::V4(_) => (MIN_IPV4_PREFIX, "IPv4"),
        IpNetwork::V6(_) => (MIN_IPV6_PREFIX, "IPv6"),
    };
    if prefix < min_prefix {
        return Err(TargetParseError::InvalidCidr(format!(
            "{input}: /{prefix} is too large for {family} (minimum prefix: /{min_prefix})"
        )));
    }

    let hosts: Vec<String> = network.iter().map(|ip| ip.to_string()).collect();
    if hosts.is_empty() {
        return Err(TargetParseError::InvalidCidr(format!(
            "{input}: no addresses in range"
        )));
    }
    Ok(hosts)
}

/// Expand a last-octet range like `192.168.1.1-100` (inclusive).
fn expand_octet_range(input: &str) -> Result<Vec<String>, TargetParseError> {
    let parts: Vec<&str> = input.split('.').collect();
    if parts.len() != 4 {
        return Err(TargetParseError::InvalidRange(format!(
            "{input}: expected 4 octets"
        )));
    }

    let octet = |s: &str| {
        s.parse::<u8>()
            .map_err(|_| TargetParseError::InvalidRange(format!("invalid octet: {s}")))
    };
    let a = octet(parts[0])?;
    let b = octet(parts[1])?;
    let c = octet(parts[2])?;

    let last = parts[3];
    let Some((start_str, end_str)) = last.split_once('-') else {
        let d = octet(last)?;
        return Ok(vec![Ipv4Addr::new(a, b, c, d).to_string()]);
    };

    let start = octet(start_str)?;
    let end = octet(end_str)?;
    if start > end {
        return Err(TargetParseError::InvalidRange(format!(
            "{input}: start ({start}) > end ({end})"
        )));
    }

    Ok((start..=end)
        .map(|d| Ipv4Addr::new(a, b, c, d).to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_ipv4() {
        assert_eq!(expand_targets("192.168.1.1").unwrap(), vec!["192.168.1.1"]);
    }

    #[test]
    fn single_ipv6() {
        assert_eq!(expand_targets("::1").unwrap(), vec!["::1"]);
    }

    #[test]
    fn cidr_30() {
        let hosts = expand_targets("192.168.1.0/30").unwrap();
        assert_eq!(hosts.len(), 4);
        assert_eq!(hosts[0], "192.168.1.0");
        assert_eq!(hosts[3], "192.168.1.3");
    }

    #[test]
    fn cidr_24() {
        assert_eq!(expand_targets("10.0.0.0/24").unwrap().len(), 256);
    }

    #[test]
    fn cidr_too_large_rejected() {
        let err = expand_targets("10.0.0.0/8").unwrap_err().to_string();
        assert!(err.contains("too large"), "unexpected error: {err}");
        assert!(expand_targets("10.0.0.0/16").is_ok());
    }

    #[test]
    fn invalid_cidr() {
        assert!(expand_targets("192.168.1.0/33").is_err());
    }

    #[test]
    fn octet_range() {
        let hosts = expand_targets("10.0.0.2-10").unwrap();
        assert_eq!(hosts.len(), 9);
        assert_eq!(hosts.first().map(String::as_str), Some("10.0.0.2"));
        assert_eq!(hosts.last().map(String::as_str), Some("10.0.0.10"));
    }

    #[test]
    fn octet_range_start_after_end() {
        assert!(expand_targets("10.0.0.100-50").is_err());
    }

    #[test]
    fn empty_rejected() {
        assert!(expand_targets("").is_err());
        assert!(expand_targets("   ").is_err());
    }

    #[test]
    fn hostname_passes_through() {
        assert_eq!(
            expand_targets("printer.lan").unwrap(),
            vec!["printer.lan"]
        );
    }
}
