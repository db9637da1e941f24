//! SoD policy engine
//!
//! Two sources of conflicts feed every assessment:
//!
//! - **Explicit rules**: an injected `(a, b, severity, reason)` table. When HIGH
//!   conflicts are enforced the rule's `b` role is always the one dropped.
//! - **Keyword heuristics**: approval + finance is HIGH, approval + other
//!   high-privilege is MEDIUM, two high-privilege roles are MEDIUM. When the
//!   new-joiner flow enforces heuristic HIGH conflicts it drops the *weaker*
//!   role by observed strength instead.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use super::keywords::KeywordBuckets;
use super::types::{ConflictSource, PolicyOutcome, Severity, SodAssessment, SodConflict, SodRule};

const APPROVAL_FINANCE: &str = "Approval role combined with finance role (maker-checker risk)";
const APPROVAL_PRIVILEGED: &str = "Approval role combined with high-privilege role";
const BOTH_PRIVILEGED: &str = "Multiple high-privilege roles in one access set";

/// SoD policy engine over an injected rule table and keyword buckets
#[derive(Debug, Clone, Default)]
pub struct SodPolicyEngine {
    rules: Vec<SodRule>,
    keywords: KeywordBuckets,
}

impl SodPolicyEngine {
    /// Create an engine with explicit rules and default keyword buckets
    pub fn new(rules: Vec<SodRule>) -> Self {
        Self {
            rules,
            keywords: KeywordBuckets::default(),
        }
    }

    /// Replace the keyword buckets
    pub fn with_keywords(mut self, keywords: KeywordBuckets) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn rules(&self) -> &[SodRule] {
        &self.rules
    }

    pub fn keywords(&self) -> &KeywordBuckets {
        &self.keywords
    }

    /// Explicit-rule conflicts among `roles`
    ///
    /// Only rules whose both roles are present match. Output is ordered by
    /// severity rank descending; equal severities keep rule-table order.
    pub fn detect_conflicts<'a, I>(&self, roles: I) -> Vec<SodConflict>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: HashSet<&str> = roles.into_iter().collect();

        let mut conflicts: Vec<SodConflict> = self
            .rules
            .iter()
            .filter(|rule| present.contains(rule.a.as_str()) && present.contains(rule.b.as_str()))
            .map(|rule| SodConflict {
                role_a: rule.a.clone(),
                role_b: rule.b.clone(),
                severity: rule.severity,
                rationale: rule.reason.clone(),
                source: ConflictSource::ExplicitRule,
            })
            .collect();

        // Stable: ties stay in rule order
        conflicts.sort_by(|x, y| y.severity.rank().cmp(&x.severity.rank()));
        conflicts
    }

    /// Apply the explicit-rule policy to a candidate role list
    ///
    /// With `block_high`, the `b` role of every HIGH explicit conflict is
    /// removed. MEDIUM and LOW conflicts are reported only.
    pub fn apply_policy<S: AsRef<str>>(&self, candidate_roles: &[S], block_high: bool) -> PolicyOutcome {
        let mut kept: BTreeSet<String> = candidate_roles
            .iter()
            .map(|r| r.as_ref().to_string())
            .collect();
        let conflicts = self.detect_conflicts(kept.iter().map(String::as_str));

        let mut removed = BTreeSet::new();
        if block_high {
            for conflict in conflicts.iter().filter(|c| c.severity == Severity::High) {
                if kept.remove(&conflict.role_b) {
                    debug!(
                        kept = %conflict.role_a,
                        removed = %conflict.role_b,
                        "explicit HIGH SoD conflict enforced"
                    );
                    removed.insert(conflict.role_b.clone());
                }
            }
        }

        PolicyOutcome {
            kept: kept.into_iter().collect(),
            removed: removed.into_iter().collect(),
            conflicts,
        }
    }

    /// Assess a role set against explicit rules and keyword heuristics
    ///
    /// Pairs are evaluated over the sorted distinct roles, so the result does
    /// not depend on input order. Identical conflicts are reported once.
    pub fn assess_heuristic<I, S>(&self, bundle_roles: I) -> SodAssessment
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles: BTreeSet<String> = bundle_roles
            .into_iter()
            .map(|r| r.as_ref().to_string())
            .collect();
        let roles: Vec<String> = roles.into_iter().collect();

        let mut conflicts = self.detect_conflicts(roles.iter().map(String::as_str));
        let classes: Vec<_> = roles.iter().map(|r| self.keywords.classify(r)).collect();

        for i in 0..roles.len() {
            for j in (i + 1)..roles.len() {
                let (ca, cb) = (classes[i], classes[j]);
                let mut flag = |severity: Severity, rationale: &str| {
                    conflicts.push(SodConflict {
                        role_a: roles[i].clone(),
                        role_b: roles[j].clone(),
                        severity,
                        rationale: rationale.to_string(),
                        source: ConflictSource::Heuristic,
                    });
                };

                let approval_finance = (ca.approval && cb.finance) || (cb.approval && ca.finance);
                let approval_privileged = (ca.approval && cb.high_privilege && !cb.finance)
                    || (cb.approval && ca.high_privilege && !ca.finance);

                if approval_finance {
                    flag(Severity::High, APPROVAL_FINANCE);
                } else if approval_privileged {
                    flag(Severity::Medium, APPROVAL_PRIVILEGED);
                }
                if ca.high_privilege && cb.high_privilege {
                    flag(Severity::Medium, BOTH_PRIVILEGED);
                }
            }
        }

        let mut seen = HashSet::new();
        conflicts.retain(|c| {
            seen.insert((
                c.role_a.clone(),
                c.role_b.clone(),
                c.severity,
                c.rationale.clone(),
            ))
        });
        conflicts.sort_by(|x, y| y.severity.rank().cmp(&x.severity.rank()));

        let risk = conflicts
            .iter()
            .map(|c| c.severity)
            .max()
            .unwrap_or(Severity::Low);

        SodAssessment { risk, conflicts }
    }
}

/// Resolve heuristic HIGH conflicts by dropping the weaker role of each pair
///
/// Strength is the observed user count for a role (missing roles count as 0).
/// On a tie the second role of the pair is dropped. Pairs whose roles are no
/// longer both present are skipped. Returns `(kept, removed)`, both sorted.
pub fn remove_for_high_conflicts<S: AsRef<str>>(
    roles: &[S],
    high_conflict_pairs: &[(String, String)],
    strength: &HashMap<String, usize>,
) -> (Vec<String>, Vec<String>) {
    let mut kept: BTreeSet<String> = roles.iter().map(|r| r.as_ref().to_string()).collect();
    let mut removed: BTreeSet<String> = BTreeSet::new();

    for (a, b) in high_conflict_pairs {
        if !(kept.contains(a) && kept.contains(b)) {
            continue;
        }
        let sa = strength.get(a).copied().unwrap_or(0);
        let sb = strength.get(b).copied().unwrap_or(0);
        let drop = if sa < sb { a } else { b };

        if kept.remove(drop) {
            removed.insert(drop.clone());
        }
    }

    (kept.into_iter().collect(), removed.into_iter().collect())
}
