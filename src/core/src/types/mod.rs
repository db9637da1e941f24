//! Data model types

pub mod dataset;
pub mod group;
pub mod record;
pub mod user_roles;

pub use dataset::{Dataset, DatasetStore, RecordFilter};
pub use group::GroupKey;
pub use record::{AccessRecord, Column};
pub use user_roles::UserRoleSets;
