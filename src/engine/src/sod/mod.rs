//! Separation-of-Duties policy engine
//!
//! Screens role sets against an injected explicit rule table and keyword
//! heuristics, and resolves HIGH conflicts deterministically.
//!
//! # Example
//!
//! ```rust
//! use brb_engine::sod::{Severity, SodPolicyEngine, SodRule};
//!
//! let engine = SodPolicyEngine::new(vec![
//!     SodRule::new("AR_FIN_1", "AR_FIN_2", Severity::High, "Maker-checker violation"),
//! ]);
//!
//! let outcome = engine.apply_policy(&["AR_FIN_1", "AR_FIN_2"], true);
//! assert_eq!(outcome.kept, vec!["AR_FIN_1".to_string()]);
//! assert_eq!(outcome.removed, vec!["AR_FIN_2".to_string()]);
//! ```

pub mod keywords;
pub mod policy;
pub mod types;

pub use keywords::{KeywordBuckets, RoleClass};
pub use policy::{remove_for_high_conflicts, SodPolicyEngine};
pub use types::{ConflictSource, PolicyOutcome, Severity, SodAssessment, SodConflict, SodRule};
