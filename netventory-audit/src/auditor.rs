use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use netventory_rules::ServiceRuleTable;
use netventory_types::{Device, Severity, Vulnerability};
use tracing::warn;

use crate::types::{AnalysisError, AuditReport, SecurityReport};

/// Evaluates a device's open services against the insecure-service catalog.
///
/// Stateless across calls: auditing the same device twice yields identical
/// scores and finding sets.
#[derive(Debug, Clone)]
pub struct SecurityAuditor {
    rules: Arc<ServiceRuleTable>,
}

impl SecurityAuditor {
    pub fn new(rules: Arc<ServiceRuleTable>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ServiceRuleTable {
        &self.rules
    }

    /// Audit one device's services.
    ///
    /// Catalog ports produce a finding with the catalog's name, severity, and
    /// description plus the observed product/version. Plain HTTP off port 443
    /// produces a synthetic medium finding. The summed severity weight buckets
    /// into the overall level.
    pub fn audit(&self, device: &Device) -> Result<AuditReport, AnalysisError> {
        if device.address.is_empty() {
            return Err(AnalysisError::EmptyAddress);
        }

        let mut vulnerabilities = Vec::new();
        let mut total_score: u32 = 0;

        for (&port, service) in &device.services {
            if let Some(rule) = self.rules.get(port) {
                vulnerabilities.push(Vulnerability {
                    name: rule.name.to_string(),
                    port,
                    severity: rule.severity,
                    description: rule.description.to_string(),
                    service_product: service.product.clone(),
                    service_version: service.version.clone(),
                });
                total_score += rule.severity.weight();
            } else if service.name.eq_ignore_ascii_case("http") && port != 443 {
                vulnerabilities.push(Vulnerability {
                    name: "HTTP without SSL".to_string(),
                    port,
                    severity: Severity::Medium,
                    description: "Web service without SSL/TLS encryption".to_string(),
                    service_product: service.product.clone(),
                    service_version: service.version.clone(),
                });
                total_score += Severity::Medium.weight();
            }
        }

        Ok(AuditReport {
            device_address: device.address.clone(),
            device_hostname: device.hostname.clone(),
            risk_level: Severity::from_score(total_score),
            risk_score: total_score,
            vulnerabilities: vulnerabilities.clone(),
            recommendations: self.recommendations(&vulnerabilities),
            scanned_at: Utc::now(),
        })
    }

    /// Per-finding advice plus three generic hardening items when anything
    /// was flagged. Set semantics with deterministic order.
    fn recommendations(&self, vulnerabilities: &[Vulnerability]) -> Vec<String> {
        let mut out = std::collections::BTreeSet::new();

        for vuln in vulnerabilities {
            if let Some(advice) = self.rules.advice(&vuln.name) {
                out.insert(advice);
            }
        }

        if !vulnerabilities.is_empty() {
            out.insert("Deploy a firewall to filter unauthorized traffic".to_string());
            out.insert("Keep all services patched and up to date".to_string());
            out.insert("Run periodic security audits".to_string());
        }

        out.into_iter().collect()
    }

    /// Audit a whole scan run.
    ///
    /// A device that fails its individual audit is logged and skipped; it
    /// never aborts the batch.
    pub fn security_report(&self, devices: &[Device]) -> SecurityReport {
        let mut risk_summary: BTreeMap<Severity, usize> = BTreeMap::new();
        let mut device_reports = Vec::with_capacity(devices.len());
        let mut global = std::collections::BTreeSet::new();
        let mut total_vulnerabilities = 0;
        let mut total_risk_score: u64 = 0;

        for device in devices {
            let report = match self.audit(device) {
                Ok(r) => r,
                Err(e) => {
                    warn!(device = %device.address, error = %e, "skipping device in security report");
                    continue;
                }
            };
            *risk_summary.entry(report.risk_level).or_insert(0) += 1;
            total_vulnerabilities += report.vulnerabilities.len();
            total_risk_score += u64::from(report.risk_score);
            global.extend(report.recommendations.iter().cloned());
            device_reports.push(report);
        }

        let average_risk_score = if device_reports.is_empty() {
            0.0
        } else {
            total_risk_score as f64 / device_reports.len() as f64
        };

        SecurityReport {
            scan_date: Utc::now(),
            total_devices: devices.len(),
            risk_summary,
            device_reports,
            global_recommendations: global.into_iter().collect(),
            total_vulnerabilities,
            average_risk_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netventory_types::Service;

    fn auditor() -> SecurityAuditor {
        SecurityAuditor::new(Arc::new(ServiceRuleTable::new()))
    }

    fn device_with(services: &[(u16, &str)]) -> Device {
        let mut device = Device::new("10.0.0.1");
        for &(port, name) in services {
            device.services.insert(port, Service::new(port, "tcp", name));
        }
        device
    }

    #[test]
    fn empty_services_scores_zero() {
        let report = auditor().audit(&device_with(&[])).unwrap();
        assert_eq!(report.risk_score, 0);
        assert_eq!(report.risk_level, Severity::Info);
        assert!(report.vulnerabilities.is_empty());
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn telnet_plus_http_scenario() {
        // ssh is clean, telnet is critical (10), port-80 http is medium (5)
        let report = auditor()
            .audit(&device_with(&[(22, "ssh"), (80, "http"), (23, "telnet")]))
            .unwrap();

        assert_eq!(report.risk_score, 15);
        assert_eq!(report.risk_level, Severity::Medium);
        assert_eq!(report.vulnerabilities.len(), 2);

        let names: Vec<&str> = report
            .vulnerabilities
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert!(names.contains(&"Telnet"));
        assert!(names.contains(&"HTTP without SSL"));

        let recs = &report.recommendations;
        assert!(recs.iter().any(|r| r.contains("SSH")));
        assert!(recs.iter().any(|r| r.contains("SSL/TLS")));
        assert!(recs.iter().any(|r| r.contains("firewall")));
        assert!(recs.iter().any(|r| r.contains("patched")));
        assert!(recs.iter().any(|r| r.contains("periodic")));
    }

    #[test]
    fn https_on_443_is_not_flagged() {
        let report = auditor().audit(&device_with(&[(443, "http")])).unwrap();
        assert!(report.vulnerabilities.is_empty());
    }

    #[test]
    fn catalog_port_beats_http_check() {
        // 8080 is in the catalog, so the synthetic HTTP finding must not fire
        let report = auditor().audit(&device_with(&[(8080, "http")])).unwrap();
        assert_eq!(report.vulnerabilities.len(), 1);
        assert_eq!(report.vulnerabilities[0].name, "HTTP Alternate");
    }

    #[test]
    fn level_boundary_29_vs_30() {
        // ftp + netbios + smb (8 each) + dns (5) = 29, one point under critical
        let report = auditor()
            .audit(&device_with(&[(21, "ftp"), (139, "netbios"), (445, "smb"), (53, "dns")]))
            .unwrap();
        assert_eq!(report.risk_score, 29);
        assert_eq!(report.risk_level, Severity::High);

        let report = auditor()
            .audit(&device_with(&[
                (21, "ftp"),
                (139, "netbios"),
                (445, "smb"),
                (53, "dns"),
                (80, "http"),
            ]))
            .unwrap();
        assert_eq!(report.risk_score, 34);
        assert_eq!(report.risk_level, Severity::Critical);
    }

    #[test]
    fn audit_is_idempotent() {
        let device = device_with(&[(23, "telnet"), (80, "http"), (3306, "mysql")]);
        let a = auditor();
        let first = a.audit(&device).unwrap();
        let second = a.audit(&device).unwrap();
        assert_eq!(first.risk_score, second.risk_score);
        assert_eq!(first.risk_level, second.risk_level);
        assert_eq!(first.vulnerabilities.len(), second.vulnerabilities.len());
        assert_eq!(first.recommendations, second.recommendations);
    }

    #[test]
    fn empty_address_is_rejected() {
        let mut device = device_with(&[(23, "telnet")]);
        device.address.clear();
        assert!(matches!(
            auditor().audit(&device),
            Err(AnalysisError::EmptyAddress)
        ));
    }

    #[test]
    fn finding_carries_product_and_version() {
        let mut device = Device::new("10.0.0.1");
        let mut svc = Service::new(21, "tcp", "ftp");
        svc.product = Some("vsftpd".into());
        svc.version = Some("3.0.3".into());
        device.services.insert(21, svc);

        let report = auditor().audit(&device).unwrap();
        let vuln = &report.vulnerabilities[0];
        assert_eq!(vuln.service_product.as_deref(), Some("vsftpd"));
        assert_eq!(vuln.service_version.as_deref(), Some("3.0.3"));
    }

    #[test]
    fn security_report_aggregates() {
        let a = auditor();
        let clean = device_with(&[(22, "ssh")]);
        let risky = device_with(&[(23, "telnet")]);
        let report = a.security_report(&[clean, risky]);

        assert_eq!(report.total_devices, 2);
        assert_eq!(report.risk_summary.get(&Severity::Info), Some(&1));
        assert_eq!(report.risk_summary.get(&Severity::Medium), Some(&1));
        assert_eq!(report.total_vulnerabilities, 1);
        assert!((report.average_risk_score - 5.0).abs() < f64::EPSILON);
        assert!(
            report
                .global_recommendations
                .iter()
                .any(|r| r.contains("SSH"))
        );
    }

    #[test]
    fn security_report_skips_bad_device() {
        let a = auditor();
        let mut bad = device_with(&[(23, "telnet")]);
        bad.address.clear();
        let good = device_with(&[(22, "ssh")]);

        let report = a.security_report(&[bad, good]);
        assert_eq!(report.total_devices, 2);
        assert_eq!(report.device_reports.len(), 1);
    }
}
