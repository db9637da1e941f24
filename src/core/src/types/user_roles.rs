//! Per-user role sets within a scope

use std::collections::{BTreeMap, BTreeSet};

use super::record::AccessRecord;

/// Mapping from user to the distinct roles held within a scope
///
/// A user only appears if at least one record names them, so every role set
/// is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRoleSets {
    users: BTreeMap<String, BTreeSet<String>>,
}

impl UserRoleSets {
    /// Build role sets from a scope's records
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AccessRecord>) -> Self {
        let mut users: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for record in records {
            users
                .entry(record.user_id.clone())
                .or_default()
                .insert(record.role_name.clone());
        }
        Self { users }
    }

    /// Number of distinct users
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Iterate users and their role sets in user order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.users.iter()
    }

    /// Number of users holding each role
    pub fn role_counts(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for roles in self.users.values() {
            for role in roles {
                *counts.entry(role.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}
