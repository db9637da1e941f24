//! Access explanation: why does a user hold a role?
//!
//! Combines the user's own attributes with peer evidence from their
//! supervisor group × job code cohort, plus a keyword-based risk and
//! approver level for the role.

use brb_core::{AccessRecord, Dataset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::mining::itemsets::pct;
use crate::sod::Severity;

/// Role-name fragments marking privileged access
pub const PRIVILEGED_KEYWORDS: &[&str] = &[
    "admin", "write", "delete", "root", "priv", "owner", "fin", "pay", "approve",
];

const MAX_SAMPLE_ROLES: usize = 15;
const MAX_SAMPLE_PEERS: usize = 10;

/// Approval tier required for a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApproverLevel {
    /// Normal applications
    L1,
    /// Privileged or high-risk access
    L2,
}

impl fmt::Display for ApproverLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApproverLevel::L1 => write!(f, "L1"),
            ApproverLevel::L2 => write!(f, "L2"),
        }
    }
}

/// Classify a role name against [`PRIVILEGED_KEYWORDS`]
pub fn classify_access_risk(role_name: &str) -> Severity {
    let lowered = role_name.to_lowercase();
    if PRIVILEGED_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Severity::High
    } else {
        Severity::Low
    }
}

/// Approver level for a role: L2 for privileged roles, L1 otherwise
pub fn approver_level(role_name: &str) -> ApproverLevel {
    match classify_access_risk(role_name) {
        Severity::High => ApproverLevel::L2,
        _ => ApproverLevel::L1,
    }
}

/// Prevalence of the role among the user's peers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerEvidence {
    pub group_users_total: usize,
    pub role_users_in_group: usize,
    pub role_prevalence_in_group_pct: f64,
    pub sample_peer_user_ids: Vec<String>,
}

/// Explanation for one (user, role) assignment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessExplanation {
    pub user_id: String,
    pub role_name: String,
    pub approver_level: ApproverLevel,
    pub risk: Severity,
    pub reasons: Vec<String>,
    pub department: Option<String>,
    pub job_code: Option<String>,
    pub supervisor_group: Option<String>,
    pub assignment_types: Vec<String>,
    pub user_roles_count: usize,
    /// Absent when the user lacks a supervisor group or job code
    pub peer_evidence: Option<PeerEvidence>,
}

impl AccessExplanation {
    /// Peer group size, zero without peer evidence
    pub fn similar_users_count(&self) -> usize {
        self.peer_evidence
            .as_ref()
            .map_or(0, |evidence| evidence.group_users_total)
    }
}

fn first_non_blank<'a, F>(records: &[&'a AccessRecord], field: F) -> Option<String>
where
    F: Fn(&'a AccessRecord) -> &'a str,
{
    records
        .iter()
        .map(|r| field(*r))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Explain why `user_id` holds `role_name`
///
/// Inputs are trimmed. Fails with [`EngineError::UserNotFound`] when the
/// user has no rows and [`EngineError::RoleNotHeld`] when the user exists
/// without the role.
pub fn explain_access(dataset: &Dataset, user_id: &str, role_name: &str) -> Result<AccessExplanation> {
    let user_id = user_id.trim();
    let role_name = role_name.trim();

    let user_records: Vec<&AccessRecord> = dataset.records_for_user(user_id).collect();
    if user_records.is_empty() {
        return Err(EngineError::UserNotFound(user_id.to_string()));
    }

    let user_roles: BTreeSet<&str> = user_records.iter().map(|r| r.role_name.as_str()).collect();
    if !user_roles.contains(role_name) {
        return Err(EngineError::RoleNotHeld {
            user_id: user_id.to_string(),
            role_name: role_name.to_string(),
            sample_roles: user_roles
                .iter()
                .take(MAX_SAMPLE_ROLES)
                .map(|r| r.to_string())
                .collect(),
        });
    }

    let supervisor_group = first_non_blank(&user_records, |r| r.supervisor_group.as_str());
    let job_code = first_non_blank(&user_records, |r| r.job_code.as_str());
    let department = first_non_blank(&user_records, |r| r.department.as_str());
    let assignment_types: Vec<String> = user_records
        .iter()
        .filter_map(|r| r.assignment_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let peer_evidence = match (&supervisor_group, &job_code) {
        (Some(sup), Some(job)) => Some(peer_evidence(dataset, sup, job, role_name)),
        _ => None,
    };

    let mut reasons = Vec::new();
    if assignment_types.iter().any(|t| t.eq_ignore_ascii_case("birthright")) {
        reasons.push("Role is likely Birthright (assigned broadly to this cohort).".to_string());
    }
    if let Some(job) = &job_code {
        reasons.push(format!("User job_code={} suggests job-based access pattern.", job));
    }
    if let Some(dept) = &department {
        reasons.push(format!(
            "User department={} provides business context (may be cross-functional).",
            dept
        ));
    }
    if let (Some(evidence), Some(sup), Some(job)) = (&peer_evidence, &supervisor_group, &job_code) {
        reasons.push(format!(
            "In peer group (supervisor_group={}, job_code={}), {}/{} users have this role ({:?}%).",
            sup,
            job,
            evidence.role_users_in_group,
            evidence.group_users_total,
            evidence.role_prevalence_in_group_pct
        ));
    }
    reasons.push(format!("User has role {} in source extract.", role_name));

    debug!(user_id, role_name, reasons = reasons.len(), "access explained");

    Ok(AccessExplanation {
        user_id: user_id.to_string(),
        role_name: role_name.to_string(),
        approver_level: approver_level(role_name),
        risk: classify_access_risk(role_name),
        reasons,
        department,
        job_code,
        supervisor_group,
        assignment_types,
        user_roles_count: user_roles.len(),
        peer_evidence,
    })
}

fn peer_evidence(dataset: &Dataset, supervisor_group: &str, job_code: &str, role_name: &str) -> PeerEvidence {
    let mut group_users = BTreeSet::new();
    let mut role_users = BTreeSet::new();
    for record in dataset
        .records()
        .iter()
        .filter(|r| r.supervisor_group == supervisor_group && r.job_code == job_code)
    {
        group_users.insert(record.user_id.as_str());
        if record.role_name == role_name {
            role_users.insert(record.user_id.as_str());
        }
    }

    PeerEvidence {
        group_users_total: group_users.len(),
        role_users_in_group: role_users.len(),
        role_prevalence_in_group_pct: pct(role_users.len(), group_users.len()),
        sample_peer_user_ids: group_users
            .iter()
            .take(MAX_SAMPLE_PEERS)
            .map(|u| u.to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_access_risk() {
        assert_eq!(classify_access_risk("AR_FIN_1"), Severity::High);
        assert_eq!(classify_access_risk("db_Admin"), Severity::High);
        assert_eq!(classify_access_risk("AR_CORE_1"), Severity::Low);
    }

    #[test]
    fn test_approver_level() {
        assert_eq!(approver_level("AR_PAYROLL"), ApproverLevel::L2);
        assert_eq!(approver_level("AR_OPS_1"), ApproverLevel::L1);
        assert_eq!(ApproverLevel::L2.to_string(), "L2");
    }
}
