// ---------------------------------------------------------------------------
// Analysis result types
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use netventory_types::{DeviceType, Severity, TrafficLight, Vulnerability};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("device has an empty address")]
    EmptyAddress,
}

/// Outcome of the rule-based security audit for one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub device_address: String,
    pub device_hostname: String,
    pub risk_level: Severity,
    /// Summed severity weight across all findings.
    pub risk_score: u32,
    pub vulnerabilities: Vec<Vulnerability>,
    /// Deduplicated, deterministically ordered.
    pub recommendations: Vec<String>,
    pub scanned_at: DateTime<Utc>,
}

/// Outcome of the heuristic analysis for one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicReport {
    pub device_type: DeviceType,
    /// 0 (worst) to 100 (best).
    pub security_score: u8,
    pub recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

/// Combined, normalized outcome of both analyses for one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    /// Normalized combined score in [0, 10].
    pub risk_score: f64,
    pub risk_level: TrafficLight,
    /// Hex color for presentation collaborators.
    pub risk_color: String,
    pub recommendations: Vec<String>,
    /// Audit sub-score on the 0–100 scale (summed weight, capped).
    pub security_score: u8,
    /// Heuristic sub-score on the 0–100 scale.
    pub ai_score: u8,
    pub analyzed_at: DateTime<Utc>,
}

/// Fleet-wide security report across one scan run's devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityReport {
    pub scan_date: DateTime<Utc>,
    pub total_devices: usize,
    /// Device count per overall severity bucket.
    pub risk_summary: BTreeMap<Severity, usize>,
    pub device_reports: Vec<AuditReport>,
    pub global_recommendations: Vec<String>,
    pub total_vulnerabilities: usize,
    pub average_risk_score: f64,
}

/// A device whose heuristic score fell below the critical threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalDevice {
    pub address: String,
    pub hostname: String,
    pub score: u8,
    pub device_type: DeviceType,
}

/// Network-wide heuristic summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInsight {
    pub device_types: BTreeMap<DeviceType, usize>,
    pub average_security_score: f64,
    pub critical_devices: Vec<CriticalDevice>,
    pub global_recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}
