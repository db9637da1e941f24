//! Mining parameters and bundle suggestion records

use brb_core::{Column, GroupKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sod::{Severity, SodConflict};

/// Coarse bucketing of itemset coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceTier {
    /// Coverage ≥ 80%
    Strong,
    /// Coverage ≥ 60%
    Medium,
    Weak,
}

impl ConfidenceTier {
    /// Tier for a coverage percentage (0-100)
    pub fn from_coverage(coverage_pct: f64) -> Self {
        if coverage_pct >= 80.0 {
            Self::Strong
        } else if coverage_pct >= 60.0 {
            Self::Medium
        } else {
            Self::Weak
        }
    }

    /// Sort rank, strongest first
    pub fn rank(&self) -> u8 {
        match self {
            Self::Strong => 0,
            Self::Medium => 1,
            Self::Weak => 2,
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strong => write!(f, "STRONG"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Weak => write!(f, "WEAK"),
        }
    }
}

/// Parameters for a mining run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningParams {
    /// Categorical columns forming the cohort key
    #[serde(default = "default_group_columns")]
    pub group_columns: Vec<Column>,

    /// Minimum single-role support within a group
    #[serde(default = "default_min_role_support")]
    pub min_role_support: f64,

    /// Requested minimum itemset support (may be capped for small groups)
    #[serde(default = "default_min_itemset_support")]
    pub min_itemset_support: f64,

    /// Largest bundle size evaluated
    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Groups with fewer distinct users are skipped
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,
}

impl Default for MiningParams {
    fn default() -> Self {
        Self {
            group_columns: default_group_columns(),
            min_role_support: default_min_role_support(),
            min_itemset_support: default_min_itemset_support(),
            max_k: default_max_k(),
            min_group_size: default_min_group_size(),
        }
    }
}

fn default_group_columns() -> Vec<Column> {
    vec![Column::SupervisorGroup, Column::JobCode]
}

fn default_min_role_support() -> f64 {
    0.60
}

fn default_min_itemset_support() -> f64 {
    0.70
}

fn default_max_k() -> usize {
    3
}

fn default_min_group_size() -> usize {
    10
}

/// A suggested access bundle for one cohort
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleSuggestion {
    pub group: GroupKey,
    /// Roles in canonical (sorted) order
    pub bundle_roles: Vec<String>,
    pub bundle_size: usize,
    pub users_in_group: usize,
    pub users_covered: usize,
    pub coverage_pct: f64,
    pub confidence_tier: ConfidenceTier,
    pub requested_min_itemset_support: f64,
    pub effective_itemset_support: f64,
    pub min_itemset_count: usize,
    pub explain: String,
    pub sod_risk: Severity,
    pub sod_conflict_count: usize,
    pub sod_conflicts: Vec<SodConflict>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(ConfidenceTier::from_coverage(80.0), ConfidenceTier::Strong);
        assert_eq!(ConfidenceTier::from_coverage(79.99), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_coverage(60.0), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_coverage(59.99), ConfidenceTier::Weak);
    }

    #[test]
    fn test_default_params() {
        let params = MiningParams::default();
        assert_eq!(params.group_columns, vec![Column::SupervisorGroup, Column::JobCode]);
        assert_eq!(params.min_group_size, 10);
        assert_eq!(params.max_k, 3);
    }
}
