//! Role usage metrics
//!
//! Per-group role coverage, per-user access summaries and pairwise role
//! overlap (Jaccard similarity over the users holding each role).

use brb_core::{Column, Dataset, GroupKey, UserRoleSets};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::mining::itemsets::{pct, round_to};

/// Coverage of one role within one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleUsageRow {
    pub group: GroupKey,
    pub role_name: String,
    pub users_with_role: usize,
    pub users_in_group: usize,
    pub role_coverage_pct: f64,
}

/// One user's access footprint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAccessSummary {
    pub user_id: String,
    pub department: String,
    pub job_code: String,
    pub supervisor_group: String,
    /// Distinct assignment types, sorted
    #[serde(serialize_with = "serialize_joined")]
    pub assignment_types: Vec<String>,
    pub role_count: usize,
}

/// Overlap between the user populations of two roles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleOverlapRow {
    pub role_a: String,
    pub role_b: String,
    pub common_users: usize,
    pub union_users: usize,
    pub jaccard: f64,
}

fn serialize_joined<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&values.join(","))
}

/// Fraction of each group's users holding each role
///
/// Sorted by group key, then coverage descending, then role name.
pub fn role_usage_metrics(dataset: &Dataset, group_columns: &[Column]) -> Vec<RoleUsageRow> {
    let mut required = vec![Column::UserId, Column::RoleName];
    required.extend(group_columns.iter().copied());
    let missing = dataset.missing_columns(&required);
    if !missing.is_empty() {
        warn!(?missing, "role usage metrics skipped: dataset is missing required columns");
        return Vec::new();
    }

    let mut rows = Vec::new();
    for (key, records) in GroupKey::group(dataset.records(), group_columns) {
        let user_roles = UserRoleSets::from_records(records.iter().copied());
        let users_in_group = user_roles.user_count();

        let mut group_rows: Vec<RoleUsageRow> = user_roles
            .role_counts()
            .into_iter()
            .map(|(role_name, users_with_role)| RoleUsageRow {
                group: key.clone(),
                role_name,
                users_with_role,
                users_in_group,
                role_coverage_pct: pct(users_with_role, users_in_group),
            })
            .collect();

        group_rows.sort_by(|a, b| {
            b.role_coverage_pct
                .total_cmp(&a.role_coverage_pct)
                .then_with(|| a.role_name.cmp(&b.role_name))
        });
        rows.extend(group_rows);
    }

    info!(rows = rows.len(), "role usage metrics computed");
    rows
}

#[derive(Default)]
struct UserAggregate {
    department: String,
    job_code: String,
    supervisor_group: String,
    assignment_types: BTreeSet<String>,
    roles: BTreeSet<String>,
}

fn first_observed(slot: &mut String, value: &str) {
    if slot.is_empty() && !value.is_empty() {
        *slot = value.to_string();
    }
}

/// One row per distinct user, sorted by role count descending then user id
///
/// Attributes take the first non-blank value observed for the user.
pub fn user_access_summary(dataset: &Dataset) -> Vec<UserAccessSummary> {
    let missing = dataset.missing_columns(&[Column::UserId, Column::RoleName]);
    if !missing.is_empty() {
        warn!(?missing, "user access summary skipped: dataset is missing required columns");
        return Vec::new();
    }

    let mut users: IndexMap<&str, UserAggregate> = IndexMap::new();
    for record in dataset.records() {
        let agg = users.entry(record.user_id.as_str()).or_default();
        first_observed(&mut agg.department, &record.department);
        first_observed(&mut agg.job_code, &record.job_code);
        first_observed(&mut agg.supervisor_group, &record.supervisor_group);
        if let Some(assignment_type) = &record.assignment_type {
            agg.assignment_types.insert(assignment_type.clone());
        }
        agg.roles.insert(record.role_name.clone());
    }

    let mut rows: Vec<UserAccessSummary> = users
        .into_iter()
        .map(|(user_id, agg)| UserAccessSummary {
            user_id: user_id.to_string(),
            department: agg.department,
            job_code: agg.job_code,
            supervisor_group: agg.supervisor_group,
            assignment_types: agg.assignment_types.into_iter().collect(),
            role_count: agg.roles.len(),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.role_count
            .cmp(&a.role_count)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    rows
}

/// Jaccard similarity of two sets: |A ∩ B| / |A ∪ B|
pub fn jaccard_similarity(set_a: &BTreeSet<String>, set_b: &BTreeSet<String>) -> f64 {
    let union = set_a.union(set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(set_b).count() as f64 / union as f64
}

/// Most similar role pairs by shared user population
///
/// Pairs sharing fewer than `min_common_users` users are excluded whatever
/// their similarity. Returns the top `top_n` by Jaccard (4 decimals)
/// descending, then common users descending.
pub fn role_overlap(dataset: &Dataset, min_common_users: usize, top_n: usize) -> Vec<RoleOverlapRow> {
    let missing = dataset.missing_columns(&[Column::UserId, Column::RoleName]);
    if !missing.is_empty() {
        warn!(?missing, "role overlap skipped: dataset is missing required columns");
        return Vec::new();
    }

    let mut role_users: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for record in dataset.records() {
        role_users
            .entry(record.role_name.as_str())
            .or_default()
            .insert(record.user_id.clone());
    }

    let roles: Vec<(&str, &BTreeSet<String>)> = role_users.iter().map(|(r, u)| (*r, u)).collect();
    let mut rows = Vec::new();

    for i in 0..roles.len() {
        let (role_a, users_a) = roles[i];
        for &(role_b, users_b) in &roles[(i + 1)..] {
            let common_users = users_a.intersection(users_b).count();
            if common_users < min_common_users {
                continue;
            }
            let union_users = users_a.union(users_b).count();

            rows.push(RoleOverlapRow {
                role_a: role_a.to_string(),
                role_b: role_b.to_string(),
                common_users,
                union_users,
                jaccard: round_to(jaccard_similarity(users_a, users_b), 4),
            });
        }
    }

    rows.sort_by(|a, b| {
        b.jaccard
            .total_cmp(&a.jaccard)
            .then_with(|| b.common_users.cmp(&a.common_users))
            .then_with(|| a.role_a.cmp(&b.role_a))
            .then_with(|| a.role_b.cmp(&b.role_b))
    });
    rows.truncate(top_n);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use brb_core::AccessRecord;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_jaccard_identical() {
        assert_eq!(jaccard_similarity(&set(&["U1", "U2"]), &set(&["U1", "U2"])), 1.0);
    }

    #[test]
    fn test_jaccard_disjoint() {
        assert_eq!(jaccard_similarity(&set(&["U1"]), &set(&["U2"])), 0.0);
    }

    #[test]
    fn test_jaccard_partial_overlap() {
        let similarity = jaccard_similarity(&set(&["U1", "U2", "U3"]), &set(&["U2", "U3", "U4"]));
        assert!((similarity - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_jaccard_empty() {
        assert_eq!(jaccard_similarity(&BTreeSet::new(), &BTreeSet::new()), 0.0);
    }

    #[test]
    fn test_summary_first_observed_attributes() {
        let ds = Dataset::from_records(vec![
            AccessRecord::new("U1", "R1").with_assignment_type("lcm"),
            AccessRecord::new("U1", "R2")
                .with_department("FIN")
                .with_assignment_type("birthright"),
            AccessRecord::new("U1", "R3").with_department("OPS"),
        ]);

        let rows = user_access_summary(&ds);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].department, "FIN");
        assert_eq!(rows[0].assignment_types, vec!["birthright", "lcm"]);
        assert_eq!(rows[0].role_count, 3);

        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["assignment_types"], "birthright,lcm");
    }
}
