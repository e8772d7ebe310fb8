use serde::{Deserialize, Serialize};
use std::fmt;

/// Scanner timing template, passed through to the external tool as `-T0`..`-T5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Intensity {
    Paranoid,
    Sneaky,
    Polite,
    Normal,
    #[default]
    Aggressive,
    Insane,
}

impl Intensity {
    /// The command-line flag handed to the external scanner.
    pub fn flag(self) -> &'static str {
        match self {
            Self::Paranoid => "-T0",
            Self::Sneaky => "-T1",
            Self::Polite => "-T2",
            Self::Normal => "-T3",
            Self::Aggressive => "-T4",
            Self::Insane => "-T5",
        }
    }

    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Paranoid,
            1 => Self::Sneaky,
            2 => Self::Polite,
            3 => Self::Normal,
            4 => Self::Aggressive,
            _ => Self::Insane,
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.flag())
    }
}

/// Configuration for one scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Target range: a literal address, CIDR block, last-octet range, or
    /// hostname (passed through to the scanner unresolved).
    pub target: String,
    pub intensity: Intensity,
    /// SNMP community handed to the hardware-enrichment collaborator.
    pub snmp_community: String,
}

impl ScanConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            intensity: Intensity::default(),
            snmp_community: "public".to_string(),
        }
    }
}
