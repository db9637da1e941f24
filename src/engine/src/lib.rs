//! # BRB Engine
//!
//! Access-bundle mining and SoD screening over an IAM access extract.
//!
//! ## Features
//!
//! - **Bundle mining**: frequent co-held role sets per cohort with dynamic
//!   thresholds for small groups
//! - **SoD policy engine**: explicit rule table plus keyword heuristics,
//!   deterministic HIGH-conflict resolution
//! - **Role metrics**: per-group coverage, per-user summaries, role overlap
//! - **New-joiner recommendations**: cohort-prevalent roles, SoD-gated
//! - **Diagnosis**: near-miss statistics when mining finds nothing
//! - **Access explanation**: peer evidence for why a user holds a role
//!
//! ## Example
//!
//! ```rust
//! use brb_engine::{generate, EngineConfig, SyntheticConfig};
//!
//! let dataset = generate(&SyntheticConfig::default());
//! let config = EngineConfig::default();
//!
//! let bundles = config.bundle_miner().suggest_itemsets(&dataset, &config.mining);
//! assert!(!bundles.is_empty());
//! ```

pub mod config;
pub mod diagnosis;
pub mod error;
pub mod explain;
pub mod metrics;
pub mod mining;
pub mod new_joiner;
pub mod sod;
pub mod synthetic;

// Re-export commonly used types
pub use config::EngineConfig;
pub use diagnosis::{diagnose, DiagnosisReport, DiagnosisRequest};
pub use error::{EngineError, Result};
pub use explain::{explain_access, AccessExplanation, ApproverLevel};
pub use metrics::{role_overlap, role_usage_metrics, user_access_summary};
pub use mining::{BundleMiner, BundleSuggestion, ConfidenceTier, MiningParams};
pub use new_joiner::{NewJoinerRecommender, NewJoinerRequest, Recommendation};
pub use sod::{Severity, SodPolicyEngine, SodRule};
pub use synthetic::{generate, SyntheticConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
