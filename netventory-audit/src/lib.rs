//! Scoring pipeline: rule-based security audit, heuristic device
//! classification, and the combined traffic-light risk score.

pub mod auditor;
pub mod classify;
pub mod heuristic;
pub mod risk;
pub mod types;

pub use auditor::SecurityAuditor;
pub use classify::DeviceClassifier;
pub use heuristic::HeuristicAnalyzer;
pub use risk::RiskAnalyzer;
pub use types::{
    AnalysisError, AuditReport, CriticalDevice, HeuristicReport, NetworkInsight, RiskReport,
    SecurityReport,
};
