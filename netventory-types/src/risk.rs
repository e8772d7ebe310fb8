use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a single finding, and the bucket for a device's summed score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Fixed weight each finding contributes to a device's summed risk score.
    pub fn weight(self) -> u32 {
        match self {
            Self::Critical => 10,
            Self::High => 8,
            Self::Medium => 5,
            Self::Low => 2,
            Self::Info => 0,
        }
    }

    /// Bucket a summed weight into an overall severity level.
    ///
    /// Thresholds are fixed and non-overlapping: ≥30 critical, ≥20 high,
    /// ≥10 medium, >0 low, 0 info.
    pub fn from_score(score: u32) -> Self {
        if score >= 30 {
            Self::Critical
        } else if score >= 20 {
            Self::High
        } else if score >= 10 {
            Self::Medium
        } else if score > 0 {
            Self::Low
        } else {
            Self::Info
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Tri-level traffic-light classification of a combined 0–10 risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLight {
    Green,
    Orange,
    Red,
}

impl TrafficLight {
    /// Classify a combined risk score.
    ///
    /// Green covers [0,3], orange [4,7], red [8,10]. A score falling outside
    /// all three closed ranges classifies as red (fail safe to worst).
    pub fn from_score(score: f64) -> Self {
        if (0.0..=3.0).contains(&score) {
            Self::Green
        } else if (4.0..=7.0).contains(&score) {
            Self::Orange
        } else {
            Self::Red
        }
    }

    /// Hex color used by presentation collaborators.
    pub fn color(self) -> &'static str {
        match self {
            Self::Green => "#4CAF50",
            Self::Orange => "#FF9800",
            Self::Red => "#F44336",
        }
    }
}

impl fmt::Display for TrafficLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Orange => write!(f, "orange"),
            Self::Red => write!(f, "red"),
        }
    }
}

/// A single flagged weakness tied to a port/service.
///
/// Produced fresh per analysis call; never cached or shared across devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    pub name: String,
    pub port: u16,
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_version: Option<String>,
}

/// Heuristic device category inferred from open ports and OS/hostname text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Router,
    Switch,
    Server,
    Workstation,
    Printer,
    Camera,
    #[default]
    Unknown,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Router => write!(f, "router"),
            Self::Switch => write!(f, "switch"),
            Self::Server => write!(f, "server"),
            Self::Workstation => write!(f, "workstation"),
            Self::Printer => write!(f, "printer"),
            Self::Camera => write!(f, "camera"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
