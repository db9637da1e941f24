//! SoD rule and conflict types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Conflict severity
///
/// Ordering follows rank: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    #[serde(alias = "low", alias = "Low")]
    Low,
    #[serde(alias = "medium", alias = "Medium")]
    Medium,
    #[serde(alias = "high", alias = "High")]
    High,
}

impl Severity {
    /// Numeric rank (HIGH=3, MEDIUM=2, LOW=1)
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

impl FromStr for Severity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            other => Err(EngineError::Configuration(format!(
                "unknown SoD severity '{}'",
                other
            ))),
        }
    }
}

/// Explicit SoD rule: holding both `a` and `b` is a conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SodRule {
    /// First role of the pair (kept when a HIGH conflict is enforced)
    pub a: String,

    /// Second role of the pair (dropped when a HIGH conflict is enforced)
    pub b: String,

    #[serde(default = "default_rule_severity")]
    pub severity: Severity,

    #[serde(default)]
    pub reason: String,
}

fn default_rule_severity() -> Severity {
    Severity::Medium
}

impl SodRule {
    pub fn new(
        a: impl Into<String>,
        b: impl Into<String>,
        severity: Severity,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            severity,
            reason: reason.into(),
        }
    }
}

/// Where a conflict came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSource {
    /// Configured rule table
    ExplicitRule,
    /// Keyword classification
    Heuristic,
}

/// A detected conflict between two roles
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SodConflict {
    pub role_a: String,
    pub role_b: String,
    pub severity: Severity,
    pub rationale: String,
    pub source: ConflictSource,
}

impl SodConflict {
    /// The conflicting pair
    pub fn pair(&self) -> (&str, &str) {
        (&self.role_a, &self.role_b)
    }
}

impl fmt::Display for SodConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} + {}: {}",
            self.severity, self.role_a, self.role_b, self.rationale
        )
    }
}

/// Heuristic risk assessment of a role set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SodAssessment {
    /// Maximum severity across conflicts (LOW when there are none)
    pub risk: Severity,
    pub conflicts: Vec<SodConflict>,
}

impl SodAssessment {
    /// Pairs involved in HIGH conflicts, in conflict order
    pub fn high_pairs(&self) -> Vec<(String, String)> {
        self.conflicts
            .iter()
            .filter(|c| c.severity == Severity::High)
            .map(|c| (c.role_a.clone(), c.role_b.clone()))
            .collect()
    }
}

/// Result of applying the explicit-rule policy to a candidate set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOutcome {
    /// Surviving roles, sorted
    pub kept: Vec<String>,
    /// Removed roles, sorted
    pub removed: Vec<String>,
    /// Every explicit conflict found in the original candidate set
    pub conflicts: Vec<SodConflict>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_rank_and_order() {
        assert_eq!(Severity::High.rank(), 3);
        assert_eq!(Severity::Medium.rank(), 2);
        assert_eq!(Severity::Low.rank(), 1);
        assert!(Severity::High > Severity::Medium);
        assert_eq!(Severity::default(), Severity::Low);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("high".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!(" Medium ".parse::<Severity>().unwrap(), Severity::Medium);
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"HIGH\"");
        let rule: SodRule = serde_json::from_str(r#"{"a":"A","b":"B"}"#).unwrap();
        assert_eq!(rule.severity, Severity::Medium);
        assert!(rule.reason.is_empty());
    }
}
