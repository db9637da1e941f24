//! Engine configuration loading and validation

use brb_core::Column;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::diagnosis::DiagnosisRequest;
use crate::error::{EngineError, Result};
use crate::mining::{BundleMiner, MiningParams};
use crate::new_joiner::{NewJoinerRecommender, NewJoinerRequest};
use crate::sod::{KeywordBuckets, SodPolicyEngine, SodRule};

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub mining: MiningParams,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub new_joiner: NewJoinerSection,

    #[serde(default)]
    pub diagnosis: DiagnosisSection,

    #[serde(default)]
    pub sod: SodSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricsSection {
    #[serde(default = "default_metrics_group_columns")]
    pub group_columns: Vec<Column>,
    #[serde(default = "default_min_common_users")]
    pub min_common_users: usize,
    #[serde(default = "default_overlap_top_n")]
    pub overlap_top_n: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewJoinerSection {
    #[serde(default = "default_new_joiner_support")]
    pub min_role_support: f64,
    #[serde(default = "default_new_joiner_top_n")]
    pub top_n: usize,
    #[serde(default = "default_true")]
    pub block_high_sod: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DiagnosisSection {
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,
    #[serde(default = "default_role_support")]
    pub min_role_support: f64,
    #[serde(default = "default_itemset_support")]
    pub min_itemset_support: f64,
    #[serde(default = "default_max_k")]
    pub max_k: usize,
    #[serde(default = "default_diagnosis_top_n")]
    pub top_n: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SodSection {
    #[serde(default)]
    pub rules: Vec<SodRule>,
    #[serde(default)]
    pub keywords: KeywordBuckets,
}

// Default value functions
fn default_true() -> bool { true }
fn default_metrics_group_columns() -> Vec<Column> { vec![Column::Department] }
fn default_min_common_users() -> usize { 5 }
fn default_overlap_top_n() -> usize { 10 }
fn default_new_joiner_support() -> f64 { 0.70 }
fn default_new_joiner_top_n() -> usize { 15 }
fn default_min_group_size() -> usize { 10 }
fn default_role_support() -> f64 { 0.60 }
fn default_itemset_support() -> f64 { 0.70 }
fn default_max_k() -> usize { 3 }
fn default_diagnosis_top_n() -> usize { 10 }

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            group_columns: default_metrics_group_columns(),
            min_common_users: default_min_common_users(),
            overlap_top_n: default_overlap_top_n(),
        }
    }
}

impl Default for NewJoinerSection {
    fn default() -> Self {
        Self {
            min_role_support: default_new_joiner_support(),
            top_n: default_new_joiner_top_n(),
            block_high_sod: default_true(),
        }
    }
}

impl Default for DiagnosisSection {
    fn default() -> Self {
        Self {
            min_group_size: default_min_group_size(),
            min_role_support: default_role_support(),
            min_itemset_support: default_itemset_support(),
            max_k: default_max_k(),
            top_n: default_diagnosis_top_n(),
        }
    }
}

impl NewJoinerSection {
    /// Request for `job_code` using the configured thresholds
    pub fn request(&self, job_code: impl Into<String>) -> NewJoinerRequest {
        NewJoinerRequest::new(job_code)
            .with_min_role_support(self.min_role_support)
            .with_top_n(self.top_n)
            .with_block_high_sod(self.block_high_sod)
    }
}

impl DiagnosisSection {
    /// Unfiltered request using the configured thresholds
    pub fn request(&self) -> DiagnosisRequest {
        DiagnosisRequest {
            min_group_size: self.min_group_size,
            min_role_support: self.min_role_support,
            min_itemset_support: self.min_itemset_support,
            max_k: self.max_k,
            top_n: self.top_n,
            ..Default::default()
        }
    }
}

impl EngineConfig {
    /// Parse configuration from a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "loading engine configuration");
        Self::from_toml_str(&contents)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let supports = [
            ("mining.min_role_support", self.mining.min_role_support),
            ("mining.min_itemset_support", self.mining.min_itemset_support),
            ("new_joiner.min_role_support", self.new_joiner.min_role_support),
            ("diagnosis.min_role_support", self.diagnosis.min_role_support),
            ("diagnosis.min_itemset_support", self.diagnosis.min_itemset_support),
        ];
        for (name, value) in supports {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Configuration(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }

        if self.mining.max_k < 2 || self.diagnosis.max_k < 2 {
            return Err(EngineError::Configuration("max_k must be at least 2".to_string()));
        }

        if self.mining.group_columns.is_empty() {
            return Err(EngineError::Configuration(
                "mining.group_columns must not be empty".to_string(),
            ));
        }

        if self.metrics.group_columns.is_empty() {
            return Err(EngineError::Configuration(
                "metrics.group_columns must not be empty".to_string(),
            ));
        }

        if let Some(rule) = self.sod.rules.iter().find(|rule| rule.a == rule.b) {
            return Err(EngineError::Configuration(format!(
                "SoD rule pairs role {} with itself",
                rule.a
            )));
        }

        Ok(())
    }

    /// Policy engine with the configured rule table and keyword buckets
    pub fn sod_engine(&self) -> SodPolicyEngine {
        SodPolicyEngine::new(self.sod.rules.clone()).with_keywords(self.sod.keywords.clone())
    }

    pub fn bundle_miner(&self) -> BundleMiner {
        BundleMiner::new(self.sod_engine())
    }

    pub fn new_joiner_recommender(&self) -> NewJoinerRecommender {
        NewJoinerRecommender::new(self.sod_engine())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sod::Severity;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.mining.min_group_size, 10);
        assert_eq!(config.metrics.group_columns, vec![Column::Department]);
        assert_eq!(config.new_joiner.top_n, 15);
        assert!(config.new_joiner.block_high_sod);
        assert_eq!(config.diagnosis.top_n, 10);
        assert!(config.sod.rules.is_empty());
    }

    #[test]
    fn test_parse_sections() {
        let config = EngineConfig::from_toml_str(
            r#"
            [mining]
            group_columns = ["department"]
            max_k = 2

            [new_joiner]
            block_high_sod = false

            [[sod.rules]]
            a = "AR_FIN_1"
            b = "AR_FIN_2"
            severity = "HIGH"
            reason = "Maker-checker violation"

            [sod.keywords]
            finance = ["ledger"]
            "#,
        )
        .unwrap();

        assert_eq!(config.mining.group_columns, vec![Column::Department]);
        assert_eq!(config.mining.max_k, 2);
        assert_eq!(config.mining.min_itemset_support, 0.70);
        assert!(!config.new_joiner.block_high_sod);
        assert_eq!(config.sod.rules.len(), 1);
        assert_eq!(config.sod.rules[0].severity, Severity::High);
        assert_eq!(config.sod.keywords.finance, vec!["ledger"]);
        assert!(config.sod.keywords.approval.contains(&"approve".to_string()));
        assert_eq!(config.sod_engine().rules().len(), 1);
    }

    #[test]
    fn test_rejects_support_out_of_range() {
        let err = EngineConfig::from_toml_str("[mining]\nmin_role_support = 1.5\n").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_rejects_small_max_k() {
        let err = EngineConfig::from_toml_str("[diagnosis]\nmax_k = 1\n").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_rejects_self_conflicting_rule() {
        let mut config = EngineConfig::default();
        config.sod.rules.push(SodRule::new("R1", "R1", Severity::High, "self"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_column() {
        let err = EngineConfig::from_toml_str("[metrics]\ngroup_columns = [\"region\"]\n").unwrap_err();
        assert!(matches!(err, EngineError::Serialization(_)));
    }

    #[test]
    fn test_section_requests() {
        let config = EngineConfig::default();
        let request = config.new_joiner.request("JC101");
        assert_eq!(request.job_code, "JC101");
        assert_eq!(request.top_n, 15);
        assert_eq!(config.diagnosis.request().min_itemset_support, 0.70);
    }
}
