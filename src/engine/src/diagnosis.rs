//! Bundle diagnosis
//!
//! Explains empty or sparse mining results: how many groups were too small,
//! which roles are common overall, and the best pair/triple support any
//! qualifying group reached versus the requested threshold.

use brb_core::{Column, Dataset, GroupKey, RecordFilter, UserRoleSets};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::mining::itemsets::{combinations, count_itemsets, frequent_roles, min_count, pct};

/// Filters and thresholds for a diagnosis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    #[serde(default)]
    pub supervisor_group: Option<String>,
    #[serde(default)]
    pub job_code: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub assignment_type: Option<String>,
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,
    #[serde(default = "default_min_role_support")]
    pub min_role_support: f64,
    #[serde(default = "default_min_itemset_support")]
    pub min_itemset_support: f64,
    #[serde(default = "default_max_k")]
    pub max_k: usize,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_min_group_size() -> usize {
    10
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

fn default_top_n() -> usize {
    10
}

impl Default for DiagnosisRequest {
    fn default() -> Self {
        Self {
            supervisor_group: None,
            job_code: None,
            department: None,
            assignment_type: None,
            min_group_size: default_min_group_size(),
            min_role_support: default_min_role_support(),
            min_itemset_support: default_min_itemset_support(),
            max_k: default_max_k(),
            top_n: default_top_n(),
        }
    }
}

impl DiagnosisRequest {
    fn record_filter(&self) -> RecordFilter {
        RecordFilter {
            supervisor_group: self.supervisor_group.clone(),
            department: self.department.clone(),
            job_code: self.job_code.clone(),
            assignment_type: self.assignment_type.clone(),
        }
    }

    /// Supervisor × job code, plus department when a department filter is set
    fn group_columns(&self) -> Vec<Column> {
        let mut columns = vec![Column::SupervisorGroup, Column::JobCode];
        if RecordFilter::active(&self.department).is_some() {
            columns.push(Column::Department);
        }
        columns
    }
}

/// Approximate cross-group support of a single role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleRoleSupport {
    pub role: String,
    /// Count over the total users of all qualifying groups; not a per-group support
    pub approx_support_pct: f64,
    pub count: usize,
}

/// Best-supported itemset observed in any qualifying group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedItemset {
    pub roles: Vec<String>,
    pub covered: usize,
    pub users_in_group: usize,
}

/// Diagnosis outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisReport {
    pub groups_checked: usize,
    pub groups_below_min_size: usize,
    pub min_group_size: usize,
    pub min_role_support: f64,
    pub min_itemset_support: f64,
    pub top_single_roles: Vec<SingleRoleSupport>,
    pub best_pair: Option<ObservedItemset>,
    pub best_pair_support_pct: f64,
    pub best_triple: Option<ObservedItemset>,
    pub best_triple_support_pct: f64,
    pub blocking_reason: String,
}

#[derive(Default)]
struct Best {
    support: f64,
    itemset: Option<ObservedItemset>,
}

impl Best {
    /// Track the first strictly-greater support
    fn observe(&mut self, candidates: Vec<Vec<String>>, counts: Vec<usize>, n_users: usize) {
        for (roles, covered) in candidates.into_iter().zip(counts) {
            let support = covered as f64 / n_users as f64;
            if support > self.support {
                self.support = support;
                self.itemset = Some(ObservedItemset {
                    roles,
                    covered,
                    users_in_group: n_users,
                });
            }
        }
    }
}

/// Diagnose why bundles are missing or sparse under the given thresholds
pub fn diagnose(dataset: &Dataset, request: &DiagnosisRequest) -> DiagnosisReport {
    let group_columns = request.group_columns();
    let mut required = vec![Column::UserId, Column::RoleName];
    required.extend(group_columns.iter().copied());
    let missing = dataset.missing_columns(&required);

    let filtered = dataset.filter(&request.record_filter());
    let groups = if missing.is_empty() {
        GroupKey::group(filtered.records(), &group_columns)
    } else {
        warn!(?missing, "diagnosis has no groups: dataset is missing required columns");
        BTreeMap::new()
    };

    let mut groups_checked = 0usize;
    let mut groups_below = 0usize;
    let mut user_count_total = 0usize;
    let mut single_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut best_pair = Best::default();
    let mut best_triple = Best::default();

    let mut blank_keys = 0usize;
    for (key, records) in &groups {
        if key.has_blank_part() {
            blank_keys += 1;
            continue;
        }
        groups_checked += 1;
        let user_roles = UserRoleSets::from_records(records.iter().copied());
        let n_users = user_roles.user_count();

        if n_users < request.min_group_size {
            groups_below += 1;
            continue;
        }
        user_count_total += n_users;

        let role_counts = user_roles.role_counts();
        for (role, count) in &role_counts {
            *single_counts.entry(role.clone()).or_insert(0) += count;
        }

        let frequent = frequent_roles(&role_counts, min_count(request.min_role_support, n_users));
        if frequent.len() < 2 {
            continue;
        }

        let pairs = combinations(&frequent, 2);
        let counts = count_itemsets(&user_roles, &pairs);
        best_pair.observe(pairs, counts, n_users);

        if request.max_k >= 3 && frequent.len() >= 3 {
            let triples = combinations(&frequent, 3);
            let counts = count_itemsets(&user_roles, &triples);
            best_triple.observe(triples, counts, n_users);
        }
    }

    let mut top_single_roles: Vec<SingleRoleSupport> = Vec::new();
    if user_count_total > 0 {
        let mut ranked: Vec<(String, usize)> = single_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_single_roles = ranked
            .into_iter()
            .take(request.top_n)
            .map(|(role, count)| SingleRoleSupport {
                approx_support_pct: pct(count, user_count_total),
                role,
                count,
            })
            .collect();
    }

    let blocking_reason = blocking_reason(
        request,
        groups_checked,
        groups_below,
        best_pair.support,
        best_triple.support,
    );

    info!(
        groups_checked,
        groups_below_min_size = groups_below,
        groups_with_blank_key = blank_keys,
        blocking_reason = %blocking_reason,
        "bundle diagnosis complete"
    );

    DiagnosisReport {
        groups_checked,
        groups_below_min_size: groups_below,
        min_group_size: request.min_group_size,
        min_role_support: request.min_role_support,
        min_itemset_support: request.min_itemset_support,
        top_single_roles,
        best_pair: best_pair.itemset,
        best_pair_support_pct: pct_of(best_pair.support),
        best_triple: best_triple.itemset,
        best_triple_support_pct: pct_of(best_triple.support),
        blocking_reason,
    }
}

fn pct_of(support: f64) -> f64 {
    crate::mining::itemsets::round_to(support * 100.0, 2)
}

fn blocking_reason(
    request: &DiagnosisRequest,
    groups_checked: usize,
    groups_below: usize,
    best_pair_support: f64,
    best_triple_support: f64,
) -> String {
    if groups_checked == 0 {
        return "No groups found after filtering.".to_string();
    }

    let threshold = request.min_itemset_support;
    let mut reasons = Vec::new();
    if groups_below == groups_checked {
        reasons.push(format!(
            "All groups below min_group_size={}.",
            request.min_group_size
        ));
    }
    if best_pair_support < threshold {
        reasons.push(format!(
            "min_itemset_support too high: best_pair_support={:.2}% < {:.2}%",
            best_pair_support * 100.0,
            threshold * 100.0
        ));
    }
    if request.max_k >= 3 && best_triple_support < threshold {
        reasons.push(format!(
            "best_triple_support={:.2}% < {:.2}%",
            best_triple_support * 100.0,
            threshold * 100.0
        ));
    }
    if reasons.is_empty() {
        reasons.push(
            "Thresholds allow bundles; if count is still low, data may be sparse for selected filters."
                .to_string(),
        );
    }
    reasons.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_columns_follow_department_filter() {
        let request = DiagnosisRequest::default();
        assert_eq!(request.group_columns(), vec![Column::SupervisorGroup, Column::JobCode]);

        let request = DiagnosisRequest {
            department: Some("FIN".to_string()),
            ..Default::default()
        };
        assert_eq!(request.group_columns().len(), 3);
    }

    #[test]
    fn test_blocking_reason_no_groups() {
        let reason = blocking_reason(&DiagnosisRequest::default(), 0, 0, 0.0, 0.0);
        assert_eq!(reason, "No groups found after filtering.");
    }

    #[test]
    fn test_blocking_reason_all_small() {
        let reason = blocking_reason(&DiagnosisRequest::default(), 3, 3, 0.0, 0.0);
        assert!(reason.starts_with("All groups below min_group_size=10."));
        assert!(reason.contains("best_pair_support=0.00% < 70.00%"));
    }

    #[test]
    fn test_blocking_reason_clear() {
        let reason = blocking_reason(&DiagnosisRequest::default(), 2, 0, 0.9, 0.8);
        assert!(reason.starts_with("Thresholds allow bundles"));
    }

    #[test]
    fn test_triple_ignored_when_max_k_is_two() {
        let request = DiagnosisRequest {
            max_k: 2,
            ..Default::default()
        };
        let reason = blocking_reason(&request, 1, 0, 0.9, 0.0);
        assert!(!reason.contains("best_triple_support"));
    }
}
