use std::sync::Arc;

use chrono::Utc;
use netventory_rules::{DeviceProfileTable, ServiceRuleTable, VersionPatternTable};
use netventory_types::{Device, TrafficLight};

use crate::auditor::SecurityAuditor;
use crate::heuristic::HeuristicAnalyzer;
use crate::types::{AnalysisError, RiskReport};

/// Audit-sum threshold above which the firewall recommendation is added.
const FIREWALL_THRESHOLD: u32 = 5;

/// Combines the rule-based audit and the heuristic analysis into one
/// normalized 0–10 risk score with a traffic-light classification.
#[derive(Debug, Clone)]
pub struct RiskAnalyzer {
    auditor: SecurityAuditor,
    heuristic: HeuristicAnalyzer,
}

impl RiskAnalyzer {
    pub fn new(
        services: Arc<ServiceRuleTable>,
        profiles: Arc<DeviceProfileTable>,
        versions: Arc<VersionPatternTable>,
    ) -> Self {
        Self {
            auditor: SecurityAuditor::new(services),
            heuristic: HeuristicAnalyzer::new(profiles, versions),
        }
    }

    /// Build an analyzer with the default rule catalogs.
    pub fn with_default_rules() -> Self {
        Self::new(
            Arc::new(ServiceRuleTable::new()),
            Arc::new(DeviceProfileTable::new()),
            Arc::new(VersionPatternTable::new()),
        )
    }

    /// Run both analyses independently and combine them.
    ///
    /// The audit sub-score is the summed severity weight capped at 100; the
    /// heuristic sub-score is already 0–100. Their mean, rescaled to 0–10
    /// and clamped, is the combined score.
    pub fn analyze(&self, device: &Device) -> Result<RiskReport, AnalysisError> {
        let audit = self.auditor.audit(device)?;
        let heuristic = self.heuristic.analyze(device)?;

        let security_score = audit.risk_score.min(100) as u8;
        let ai_score = heuristic.security_score;

        let risk_score =
            ((f64::from(security_score) + f64::from(ai_score)) / 2.0 / 10.0).clamp(0.0, 10.0);
        let risk_level = TrafficLight::from_score(risk_score);

        let mut recommendations = std::collections::BTreeSet::new();
        recommendations.extend(audit.recommendations.iter().cloned());
        recommendations.extend(heuristic.recommendations.iter().cloned());

        for (&port, service) in &device.services {
            if self.auditor.rules().contains(port) {
                recommendations.insert(format!(
                    "Close port {port} ({}) if it is not required",
                    service.name
                ));
            }
            let name = service.name.to_lowercase();
            if matches!(name.as_str(), "http" | "ftp" | "telnet") {
                recommendations.insert(format!("Enable SSL/TLS for the {name} service"));
            }
        }
        if audit.risk_score > FIREWALL_THRESHOLD {
            recommendations.insert("Enable and properly configure the firewall".to_string());
        }

        Ok(RiskReport {
            risk_score,
            risk_level,
            risk_color: risk_level.color().to_string(),
            recommendations: recommendations.into_iter().collect(),
            security_score,
            ai_score,
            analyzed_at: Utc::now(),
        })
    }
}
