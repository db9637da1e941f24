//! Keyword classification of role names
//!
//! Roles are bucketed by case-insensitive substring match against three
//! keyword lists. A role may fall into several buckets at once.

use serde::{Deserialize, Serialize};

/// Keyword lists used by the heuristic SoD assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordBuckets {
    #[serde(default = "default_high_privilege")]
    pub high_privilege: Vec<String>,

    #[serde(default = "default_finance")]
    pub finance: Vec<String>,

    #[serde(default = "default_approval")]
    pub approval: Vec<String>,
}

impl Default for KeywordBuckets {
    fn default() -> Self {
        Self {
            high_privilege: default_high_privilege(),
            finance: default_finance(),
            approval: default_approval(),
        }
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn default_high_privilege() -> Vec<String> {
    words(&["admin", "root", "write", "delete", "priv", "owner", "super"])
}

fn default_finance() -> Vec<String> {
    words(&["fin", "payment", "pay", "gl", "ledger", "invoice", "treasury"])
}

fn default_approval() -> Vec<String> {
    words(&["approve", "approval", "authorize", "authorise", "sign_off", "release"])
}

/// Buckets a role name falls into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleClass {
    pub high_privilege: bool,
    pub finance: bool,
    pub approval: bool,
}

impl KeywordBuckets {
    /// Classify a role name
    pub fn classify(&self, role_name: &str) -> RoleClass {
        let lowered = role_name.to_lowercase();
        RoleClass {
            high_privilege: Self::any_match(&lowered, &self.high_privilege),
            finance: Self::any_match(&lowered, &self.finance),
            approval: Self::any_match(&lowered, &self.approval),
        }
    }

    fn any_match(lowered: &str, keywords: &[String]) -> bool {
        keywords
            .iter()
            .filter(|k| !k.is_empty())
            .any(|k| lowered.contains(&k.to_lowercase()))
    }
}
