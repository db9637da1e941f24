//! Itemset mining engine
//!
//! Discovers role sets frequently held together within cohorts. Cohorts are
//! keyed by categorical columns (supervisor group × job code by default).
//!
//! # Features
//!
//! - **Pruning**: only roles meeting the single-role support threshold are
//!   combined into candidates
//! - **Dynamic thresholds**: itemset support is capped at 0.60 for groups of
//!   ≤ 12 users and 0.65 for ≤ 25 users
//! - **SoD screening**: every suggestion carries a heuristic risk assessment
//!
//! # Example
//!
//! ```rust
//! use brb_core::{AccessRecord, Dataset};
//! use brb_engine::mining::{BundleMiner, MiningParams};
//!
//! let records: Vec<AccessRecord> = (0..10)
//!     .flat_map(|u| {
//!         ["R1", "R2"].into_iter().map(move |role| {
//!             AccessRecord::new(format!("U{}", u), role)
//!                 .with_supervisor_group("S1")
//!                 .with_job_code("J1")
//!         })
//!     })
//!     .collect();
//!
//! let miner = BundleMiner::default();
//! let bundles = miner.suggest_itemsets(&Dataset::from_records(records), &MiningParams::default());
//! assert_eq!(bundles.len(), 1);
//! assert_eq!(bundles[0].users_covered, 10);
//! ```

pub mod itemsets;
pub mod suggest;
pub mod types;

pub use itemsets::{effective_itemset_support, Itemset};
pub use suggest::{filter_suggestions, BundleMiner};
pub use types::{BundleSuggestion, ConfidenceTier, MiningParams};
