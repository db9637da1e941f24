//! Shared itemset-counting primitives
//!
//! Used by both the bundle miner and the diagnosis pass so the two never
//! disagree on thresholds, pruning or candidate order.

use brb_core::UserRoleSets;
use std::collections::BTreeMap;

/// Canonical itemset: distinct role names in sorted order
pub type Itemset = Vec<String>;

/// Group size at or below which the itemset threshold is capped at 0.60
pub const SMALL_GROUP_USERS: usize = 12;

/// Group size at or below which the itemset threshold is capped at 0.65
pub const MEDIUM_GROUP_USERS: usize = 25;

/// Itemset support actually applied to a group of `users_in_group` users
///
/// Small cohorts are noisy (one user can move support by 8%+), so the
/// requested threshold is capped for them.
pub fn effective_itemset_support(requested: f64, users_in_group: usize) -> f64 {
    if users_in_group <= SMALL_GROUP_USERS {
        requested.min(0.60)
    } else if users_in_group <= MEDIUM_GROUP_USERS {
        requested.min(0.65)
    } else {
        requested
    }
}

/// Minimum user count meeting `support` in a group: `ceil(support × users)`
pub fn min_count(support: f64, users: usize) -> usize {
    let required = (support * users as f64).ceil();
    if required <= 0.0 {
        0
    } else {
        required as usize
    }
}

/// Percentage rounded to 2 decimals
pub fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(100.0 * part as f64 / whole as f64, 2)
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Roles held by at least `min_count` users, sorted
pub fn frequent_roles(role_counts: &BTreeMap<String, usize>, min_count: usize) -> Vec<String> {
    role_counts
        .iter()
        .filter(|(_, &count)| count >= min_count)
        .map(|(role, _)| role.clone())
        .collect()
}

/// All k-combinations of `items` in lexicographic order
///
/// `items` must already be sorted and distinct; each combination then is a
/// canonical itemset.
pub fn combinations(items: &[String], k: usize) -> Vec<Itemset> {
    let n = items.len();
    if k == 0 || k > n {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.iter().map(|&i| items[i].clone()).collect());

        // Rightmost index that can still advance
        let mut pos = k;
        loop {
            if pos == 0 {
                return out;
            }
            pos -= 1;
            if idx[pos] < n - k + pos {
                break;
            }
        }
        idx[pos] += 1;
        for next in (pos + 1)..k {
            idx[next] = idx[next - 1] + 1;
        }
    }
}

/// Number of users covering each candidate (holding every role in it)
pub fn count_itemsets(user_roles: &UserRoleSets, candidates: &[Itemset]) -> Vec<usize> {
    let mut counts = vec![0usize; candidates.len()];
    for (_, held) in user_roles.iter() {
        for (count, candidate) in counts.iter_mut().zip(candidates) {
            if candidate.iter().all(|role| held.contains(role)) {
                *count += 1;
            }
        }
    }
    counts
}
