//! # BRB Core
//!
//! Shared data model for the access-bundle engine: the flat access extract,
//! its declared columns, cohort grouping keys and per-user role sets.
//! Everything here is an immutable, in-memory view over one dataset snapshot.

pub mod error;
pub mod ingest;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use types::{
    AccessRecord, Column, Dataset, DatasetStore, GroupKey, RecordFilter, UserRoleSets,
};

