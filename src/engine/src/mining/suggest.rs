//! Grouped frequent-itemset bundle suggestion

use brb_core::{Column, Dataset, GroupKey, RecordFilter, UserRoleSets};
use tracing::{debug, info, warn};

use super::itemsets::{
    combinations, count_itemsets, effective_itemset_support, frequent_roles, min_count, pct,
};
use super::types::{BundleSuggestion, ConfidenceTier, MiningParams};
use crate::sod::SodPolicyEngine;

/// Bundle miner: frequent co-held role sets per cohort, screened for SoD risk
#[derive(Debug, Clone, Default)]
pub struct BundleMiner {
    sod: SodPolicyEngine,
}

impl BundleMiner {
    pub fn new(sod: SodPolicyEngine) -> Self {
        Self { sod }
    }

    pub fn sod(&self) -> &SodPolicyEngine {
        &self.sod
    }

    /// Suggest bundles for every qualifying group
    ///
    /// Per group: skip if fewer than `min_group_size` users; keep roles meeting
    /// `min_role_support`; count k-combinations of those roles for
    /// `k = 2..=max_k`; keep itemsets covering at least
    /// `ceil(effective_support × users)` users.
    ///
    /// Output is ordered by confidence tier (STRONG first), SoD risk (lowest
    /// first), coverage descending, then bundle size descending. A dataset
    /// missing a required column yields an empty result.
    pub fn suggest_itemsets(&self, dataset: &Dataset, params: &MiningParams) -> Vec<BundleSuggestion> {
        let mut required = vec![Column::UserId, Column::RoleName];
        required.extend(params.group_columns.iter().copied());
        let missing = dataset.missing_columns(&required);
        if !missing.is_empty() {
            warn!(?missing, "bundle mining skipped: dataset is missing required columns");
            return Vec::new();
        }

        let groups = GroupKey::group(dataset.records(), &params.group_columns);
        let mut suggestions = Vec::new();

        for (key, records) in &groups {
            let user_roles = UserRoleSets::from_records(records.iter().copied());
            let n_users = user_roles.user_count();

            if n_users < params.min_group_size {
                debug!(group = %key, n_users, "group below min_group_size, skipped");
                continue;
            }

            let effective = effective_itemset_support(params.min_itemset_support, n_users);
            let min_role_count = min_count(params.min_role_support, n_users);
            let min_itemset_count = min_count(effective, n_users);

            let frequent = frequent_roles(&user_roles.role_counts(), min_role_count);
            if frequent.len() < 2 {
                debug!(group = %key, frequent = frequent.len(), "fewer than 2 frequent roles, skipped");
                continue;
            }

            for k in 2..=params.max_k {
                if frequent.len() < k {
                    break;
                }

                let candidates = combinations(&frequent, k);
                let counts = count_itemsets(&user_roles, &candidates);

                for (itemset, covered) in candidates.into_iter().zip(counts) {
                    if covered < min_itemset_count {
                        continue;
                    }
                    suggestions.push(self.build_suggestion(
                        key,
                        itemset,
                        covered,
                        n_users,
                        params.min_itemset_support,
                        effective,
                        min_itemset_count,
                    ));
                }
            }
        }

        sort_suggestions(&mut suggestions);
        info!(
            groups = groups.len(),
            suggestions = suggestions.len(),
            "bundle mining complete"
        );
        suggestions
    }

    #[allow(clippy::too_many_arguments)]
    fn build_suggestion(
        &self,
        key: &GroupKey,
        itemset: Vec<String>,
        covered: usize,
        n_users: usize,
        requested: f64,
        effective: f64,
        min_itemset_count: usize,
    ) -> BundleSuggestion {
        let coverage_pct = pct(covered, n_users);
        let support = covered as f64 / n_users as f64;
        let assessment = self.sod.assess_heuristic(&itemset);

        let explain = format!(
            "Covered {}/{} = {:.2}%. Requested min_itemset_support={:.2}. \
             Effective min_itemset_support={:.2} (min_count={}). SoD={} ({} conflicts).",
            covered,
            n_users,
            support * 100.0,
            requested,
            effective,
            min_itemset_count,
            assessment.risk,
            assessment.conflicts.len(),
        );

        BundleSuggestion {
            group: key.clone(),
            bundle_size: itemset.len(),
            bundle_roles: itemset,
            users_in_group: n_users,
            users_covered: covered,
            coverage_pct,
            confidence_tier: ConfidenceTier::from_coverage(coverage_pct),
            requested_min_itemset_support: requested,
            effective_itemset_support: effective,
            min_itemset_count,
            explain,
            sod_risk: assessment.risk,
            sod_conflict_count: assessment.conflicts.len(),
            sod_conflicts: assessment.conflicts,
        }
    }
}

/// Stable output order across groups
fn sort_suggestions(suggestions: &mut [BundleSuggestion]) {
    suggestions.sort_by(|a, b| {
        a.confidence_tier
            .rank()
            .cmp(&b.confidence_tier.rank())
            .then_with(|| a.sod_risk.rank().cmp(&b.sod_risk.rank()))
            .then_with(|| b.coverage_pct.total_cmp(&a.coverage_pct))
            .then_with(|| b.bundle_size.cmp(&a.bundle_size))
    });
}

/// Keep suggestions whose group matches `filter`
///
/// Only filter fields naming a column the group key covers take effect.
pub fn filter_suggestions(
    suggestions: Vec<BundleSuggestion>,
    filter: &RecordFilter,
) -> Vec<BundleSuggestion> {
    let constraints = [
        (Column::SupervisorGroup, RecordFilter::active(&filter.supervisor_group)),
        (Column::JobCode, RecordFilter::active(&filter.job_code)),
        (Column::Department, RecordFilter::active(&filter.department)),
        (Column::AssignmentType, RecordFilter::active(&filter.assignment_type)),
    ];

    suggestions
        .into_iter()
        .filter(|s| {
            constraints.iter().all(|(column, expected)| match (expected, s.group.get(*column)) {
                (Some(expected), Some(actual)) => actual == *expected,
                _ => true,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use brb_core::AccessRecord;

    fn cohort(sup: &str, job: &str, users: usize, holders: usize, roles: &[&str]) -> Vec<AccessRecord> {
        let mut records = Vec::new();
        for u in 0..users {
            let user = format!("{}_{}_U{:03}", sup, job, u);
            if u < holders {
                for role in roles {
                    records.push(
                        AccessRecord::new(&user, *role)
                            .with_supervisor_group(sup)
                            .with_job_code(job),
                    );
                }
            } else {
                records.push(
                    AccessRecord::new(&user, "AR_MISC_1")
                        .with_supervisor_group(sup)
                        .with_job_code(job),
                );
            }
        }
        records
    }

    #[test]
    fn test_sort_prefers_stronger_tier() {
        let mut records = cohort("S1", "J1", 10, 7, &["R1", "R2"]);
        records.extend(cohort("S2", "J1", 10, 9, &["R3", "R4"]));
        let ds = Dataset::from_records(records);

        let out = BundleMiner::default().suggest_itemsets(&ds, &MiningParams::default());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].confidence_tier, ConfidenceTier::Strong);
        assert_eq!(out[0].bundle_roles, vec!["R3", "R4"]);
        assert_eq!(out[1].confidence_tier, ConfidenceTier::Medium);
    }

    #[test]
    fn test_filter_by_group_value() {
        let mut records = cohort("S1", "J1", 10, 8, &["R1", "R2"]);
        records.extend(cohort("S2", "J1", 10, 8, &["R1", "R2"]));
        let ds = Dataset::from_records(records);

        let out = BundleMiner::default().suggest_itemsets(&ds, &MiningParams::default());
        assert_eq!(out.len(), 2);

        let filtered = filter_suggestions(out, &RecordFilter::new().with_supervisor_group("S2"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].group.get(Column::SupervisorGroup), Some("S2"));
    }
}
