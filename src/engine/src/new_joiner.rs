//! New-joiner access recommendation
//!
//! Recommends the roles most commonly held by a joiner's cohort, then
//! screens the candidates in three steps:
//!
//! 1. Explicit SoD rules (HIGH conflicts drop the rule's `b` role)
//! 2. Heuristic assessment of the survivors
//! 3. With `block_high_sod`, heuristic HIGH conflicts drop the weaker role,
//!    followed by a re-assessment so the reported risk matches the final set

use brb_core::{Dataset, RecordFilter, UserRoleSets};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::mining::itemsets::{min_count, pct};
use crate::sod::{remove_for_high_conflicts, Severity, SodConflict, SodPolicyEngine};

/// Cohort selection and thresholds for a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJoinerRequest {
    pub job_code: String,
    #[serde(default)]
    pub supervisor_group: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default = "default_min_role_support")]
    pub min_role_support: f64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_block_high_sod")]
    pub block_high_sod: bool,
}

fn default_min_role_support() -> f64 {
    0.70
}

fn default_top_n() -> usize {
    15
}

fn default_block_high_sod() -> bool {
    true
}

impl NewJoinerRequest {
    /// Request for a job code with default thresholds
    pub fn new(job_code: impl Into<String>) -> Self {
        Self {
            job_code: job_code.into(),
            supervisor_group: None,
            department: None,
            min_role_support: default_min_role_support(),
            top_n: default_top_n(),
            block_high_sod: default_block_high_sod(),
        }
    }

    pub fn with_supervisor_group(mut self, supervisor_group: impl Into<String>) -> Self {
        self.supervisor_group = Some(supervisor_group.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_min_role_support(mut self, min_role_support: f64) -> Self {
        self.min_role_support = min_role_support;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_block_high_sod(mut self, block_high_sod: bool) -> Self {
        self.block_high_sod = block_high_sod;
        self
    }

    /// Records filter for the cohort, `None` when `job_code` is blank
    ///
    /// The job code is mandatory: a blank one matches no records instead of
    /// falling back to "unset" like the optional filters.
    fn cohort_filter(&self) -> Option<RecordFilter> {
        let job_code = self.job_code.trim();
        if job_code.is_empty() {
            return None;
        }
        Some(RecordFilter {
            supervisor_group: self.supervisor_group.clone(),
            department: self.department.clone(),
            job_code: Some(job_code.to_string()),
            assignment_type: None,
        })
    }
}

/// Why a candidate role was withheld
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalCause {
    /// HIGH conflict in the explicit rule table
    ExplicitRule,
    /// HIGH conflict from keyword heuristics
    Heuristic,
}

/// A candidate role removed by SoD enforcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRemoval {
    pub role_name: String,
    pub cause: RemovalCause,
}

/// One recommended role for the cohort
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub job_code: String,
    pub supervisor_group: String,
    pub department: String,
    pub users_in_cohort: usize,
    pub min_role_support: f64,
    pub role_name: String,
    pub users_with_role: usize,
    pub coverage_pct: f64,
    pub reason: String,
    pub sod_risk: Severity,
    pub sod_conflict_count: usize,
    pub sod_conflicts: Vec<SodConflict>,
    /// Every removed role, sorted
    pub sod_removed_roles: Vec<String>,
    pub sod_removals: Vec<RoleRemoval>,
    pub sod_policy: String,
}

impl Recommendation {
    /// Whether this is the "no users found" sentinel row
    pub fn is_sentinel(&self) -> bool {
        self.users_in_cohort == 0 && self.role_name.is_empty()
    }
}

/// Cohort-based recommender gated by the SoD policy engine
#[derive(Debug, Clone, Default)]
pub struct NewJoinerRecommender {
    sod: SodPolicyEngine,
}

impl NewJoinerRecommender {
    pub fn new(sod: SodPolicyEngine) -> Self {
        Self { sod }
    }

    /// Recommend roles for a joiner matching `request`
    ///
    /// An empty cohort yields a single sentinel row rather than an error.
    pub fn recommend(&self, dataset: &Dataset, request: &NewJoinerRequest) -> Vec<Recommendation> {
        let user_roles = match request.cohort_filter() {
            Some(filter) => UserRoleSets::from_records(dataset.filter(&filter).records()),
            None => UserRoleSets::default(),
        };
        let users_in_cohort = user_roles.user_count();

        let supervisor_group = RecordFilter::active(&request.supervisor_group)
            .unwrap_or("")
            .to_string();
        let department = RecordFilter::active(&request.department)
            .unwrap_or("")
            .to_string();
        let sod_policy = format!("block_high={} (explicit+heuristic)", request.block_high_sod);

        if users_in_cohort == 0 {
            info!(job_code = %request.job_code, "no users found for cohort");
            return vec![Recommendation {
                job_code: request.job_code.clone(),
                supervisor_group,
                department,
                users_in_cohort: 0,
                min_role_support: request.min_role_support,
                role_name: String::new(),
                users_with_role: 0,
                coverage_pct: 0.0,
                reason: "No users found for this cohort.".to_string(),
                sod_risk: Severity::Low,
                sod_conflict_count: 0,
                sod_conflicts: Vec::new(),
                sod_removed_roles: Vec::new(),
                sod_removals: Vec::new(),
                sod_policy,
            }];
        }

        let required = min_count(request.min_role_support, users_in_cohort);
        let mut ranked: Vec<(String, usize)> = user_roles.role_counts().into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let eligible: Vec<(String, usize)> = ranked
            .into_iter()
            .filter(|(_, count)| *count >= required)
            .take(request.top_n)
            .collect();
        let candidates: Vec<&str> = eligible.iter().map(|(role, _)| role.as_str()).collect();
        let strength: HashMap<String, usize> = eligible.iter().cloned().collect();

        // (1) explicit rules
        let outcome = self.sod.apply_policy(&candidates, request.block_high_sod);
        let mut kept = outcome.kept;
        let mut removals: Vec<RoleRemoval> = outcome
            .removed
            .iter()
            .map(|role| RoleRemoval {
                role_name: role.clone(),
                cause: RemovalCause::ExplicitRule,
            })
            .collect();

        // (2) heuristic assessment of what remains
        let mut assessment = self.sod.assess_heuristic(&kept);

        // (3) heuristic HIGH enforcement
        if request.block_high_sod {
            let high_pairs = assessment.high_pairs();
            if !high_pairs.is_empty() {
                let (survivors, removed) = remove_for_high_conflicts(&kept, &high_pairs, &strength);
                debug!(?removed, "heuristic HIGH SoD conflicts enforced");
                removals.extend(removed.into_iter().map(|role_name| RoleRemoval {
                    role_name,
                    cause: RemovalCause::Heuristic,
                }));
                kept = survivors;
                assessment = self.sod.assess_heuristic(&kept);
            }
        }

        removals.sort_by(|a, b| a.role_name.cmp(&b.role_name));
        let mut removed_roles: Vec<String> = removals.iter().map(|r| r.role_name.clone()).collect();
        removed_roles.dedup();

        let rows: Vec<Recommendation> = eligible
            .iter()
            .filter(|(role, _)| kept.contains(role))
            .map(|(role, count)| {
                let coverage_pct = pct(*count, users_in_cohort);
                Recommendation {
                    job_code: request.job_code.clone(),
                    supervisor_group: supervisor_group.clone(),
                    department: department.clone(),
                    users_in_cohort,
                    min_role_support: request.min_role_support,
                    role_name: role.clone(),
                    users_with_role: *count,
                    coverage_pct,
                    reason: format!(
                        "Role appears in {}/{} users ({:?}%) in cohort.",
                        count, users_in_cohort, coverage_pct
                    ),
                    sod_risk: assessment.risk,
                    sod_conflict_count: assessment.conflicts.len(),
                    sod_conflicts: assessment.conflicts.clone(),
                    sod_removed_roles: removed_roles.clone(),
                    sod_removals: removals.clone(),
                    sod_policy: sod_policy.clone(),
                }
            })
            .collect();

        info!(
            job_code = %request.job_code,
            users_in_cohort,
            recommended = rows.len(),
            removed = removed_roles.len(),
            "new-joiner recommendation complete"
        );
        rows
    }
}
