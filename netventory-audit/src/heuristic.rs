use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use netventory_rules::{DeviceProfileTable, VersionPatternTable};
use netventory_types::{Device, DeviceType};
use tracing::warn;

use crate::classify::DeviceClassifier;
use crate::types::{AnalysisError, CriticalDevice, HeuristicReport, NetworkInsight};

// Scoring weights applied to the 100-point baseline.
const WEIGHT_OPEN_PORT: i32 = -2;
const WEIGHT_SECURE_SERVICE: i32 = 5;
const WEIGHT_INSECURE_SERVICE: i32 = -5;
const WEIGHT_UPDATED_SOFTWARE: i32 = 3;
const WEIGHT_OUTDATED_SOFTWARE: i32 = -3;

/// Heuristic score threshold below which a device counts as critical.
const CRITICAL_SCORE: u8 = 50;

/// Independent heuristic scoring layer: device-type classification, a
/// weighted 0–100 security score, and recommendation generation.
#[derive(Debug, Clone)]
pub struct HeuristicAnalyzer {
    classifier: DeviceClassifier,
    versions: Arc<VersionPatternTable>,
}

impl HeuristicAnalyzer {
    pub fn new(profiles: Arc<DeviceProfileTable>, versions: Arc<VersionPatternTable>) -> Self {
        Self {
            classifier: DeviceClassifier::new(profiles),
            versions,
        }
    }

    pub fn analyze(&self, device: &Device) -> Result<HeuristicReport, AnalysisError> {
        if device.address.is_empty() {
            return Err(AnalysisError::EmptyAddress);
        }

        let device_type = self.classifier.classify(device);
        let security_score = self.security_score(device);
        let recommendations = self.recommendations(device, device_type, security_score);

        Ok(HeuristicReport {
            device_type,
            security_score,
            recommendations,
            analyzed_at: Utc::now(),
        })
    }

    /// Start at 100 and apply fixed weights per open port, per secure or
    /// insecure service name, and per recognized safe/unsafe version string.
    /// The result clamps to [0, 100].
    fn security_score(&self, device: &Device) -> u8 {
        let mut score: i32 = 100;

        score += device.services.len() as i32 * WEIGHT_OPEN_PORT;

        for service in device.services.values() {
            let name = service.name.to_lowercase();
            let version = service.version.as_deref().unwrap_or("");

            if name.contains("ssh") || name.contains("https") {
                score += WEIGHT_SECURE_SERVICE;
            }
            if name.contains("telnet") || name.contains("ftp") {
                score += WEIGHT_INSECURE_SERVICE;
            }

            for pattern in self.versions.iter() {
                if !name.contains(pattern.product) {
                    continue;
                }
                if pattern.safe.iter().any(|p| version.contains(p)) {
                    score += WEIGHT_UPDATED_SOFTWARE;
                }
                if pattern.unsafe_.iter().any(|p| version.contains(p)) {
                    score += WEIGHT_OUTDATED_SOFTWARE;
                }
            }
        }

        score.clamp(0, 100) as u8
    }

    /// Advice from three sources: insecure services, the device category,
    /// and the score band. Set semantics with deterministic order.
    fn recommendations(
        &self,
        device: &Device,
        device_type: DeviceType,
        security_score: u8,
    ) -> Vec<String> {
        let mut out = std::collections::BTreeSet::new();

        for (&port, service) in &device.services {
            let name = service.name.to_lowercase();
            if name.contains("telnet") {
                out.insert("Replace Telnet with SSH for remote access".to_string());
            } else if name.contains("ftp") {
                out.insert("Migrate from FTP to SFTP or FTPS".to_string());
            } else if port == 80 && !device.services.contains_key(&443) {
                out.insert("Serve web traffic over HTTPS".to_string());
            }
        }

        let type_advice: &[&str] = match device_type {
            DeviceType::Router => &[
                "Configure ACLs to filter unauthorized traffic",
                "Require two-factor authentication for administrative access",
                "Keep device firmware up to date",
            ],
            DeviceType::Server => &[
                "Enforce a strong password policy",
                "Configure automatic backups",
                "Monitor security logs",
            ],
            DeviceType::Workstation => &[
                "Install and keep antivirus software up to date",
                "Enable the operating system firewall",
                "Enable automatic security updates",
            ],
            _ => &[],
        };
        out.extend(type_advice.iter().map(|s| s.to_string()));

        if security_score < CRITICAL_SCORE {
            out.insert("Run a full security audit".to_string());
            out.insert("Review and update all security configurations".to_string());
            out.insert("Consider deploying an IDS/IPS".to_string());
        } else if security_score < 80 {
            out.insert("Review and update security policies".to_string());
            out.insert("Schedule periodic security audits".to_string());
        }

        out.into_iter().collect()
    }

    /// Summarize a whole scan run: type histogram, score average, devices
    /// under the critical threshold, and merged recommendations.
    ///
    /// A device that fails its individual analysis is logged and skipped.
    pub fn analyze_network(&self, devices: &[Device]) -> NetworkInsight {
        let mut device_types: BTreeMap<DeviceType, usize> = BTreeMap::new();
        let mut critical_devices = Vec::new();
        let mut global = std::collections::BTreeSet::new();
        let mut total_score: u64 = 0;
        let mut analyzed = 0usize;

        for device in devices {
            let report = match self.analyze(device) {
                Ok(r) => r,
                Err(e) => {
                    warn!(device = %device.address, error = %e, "skipping device in network analysis");
                    continue;
                }
            };
            *device_types.entry(report.device_type).or_insert(0) += 1;
            total_score += u64::from(report.security_score);
            analyzed += 1;

            if report.security_score < CRITICAL_SCORE {
                critical_devices.push(CriticalDevice {
                    address: device.address.clone(),
                    hostname: device.hostname.clone(),
                    score: report.security_score,
                    device_type: report.device_type,
                });
            }
            global.extend(report.recommendations);
        }

        NetworkInsight {
            device_types,
            average_security_score: if analyzed == 0 {
                0.0
            } else {
                total_score as f64 / analyzed as f64
            },
            critical_devices,
            global_recommendations: global.into_iter().collect(),
            analyzed_at: Utc::now(),
        }
    }
}
