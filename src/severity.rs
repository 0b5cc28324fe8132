/*!
 * Severity levels and their weights.
 *
 * `Severity` is what a keyword rule (and therefore a violation) can carry;
 * `SeverityLevel` adds `SAFE` for reports without any violation. Both are
 * totally ordered SAFE < LOW < MEDIUM < HIGH.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity attached to a keyword rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Weight used for the compound score
    pub fn weight(self) -> u64 {
        SeverityLevel::from(self).weight()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Accepts LOW / MEDIUM / HIGH in any case, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "" => Err("missing severity".to_string()),
            _ => Err(format!("unknown severity '{}'", s.trim())),
        }
    }
}

/// Report-level severity, including the empty case
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeverityLevel {
    #[default]
    Safe,
    Low,
    Medium,
    High,
}

impl SeverityLevel {
    pub fn weight(self) -> u64 {
        match self {
            Self::Safe => 0,
            Self::Low => 1,
            Self::Medium => 5,
            Self::High => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl From<Severity> for SeverityLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => Self::Low,
            Severity::Medium => Self::Medium,
            Severity::High => Self::High,
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
