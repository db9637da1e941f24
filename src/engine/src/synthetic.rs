//! Seeded synthetic access extract
//!
//! Produces a realistic-looking extract for demos, tests and benchmarks:
//! each supervisor group shares a three-role core bundle, job families add
//! finance or operations roles, and a minority of users carry a noise role.

use brb_core::{AccessRecord, Column, Dataset};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

const JOB_CODES: [&str; 4] = ["JC101", "JC102", "JC201", "JC202"];
const ASSIGNMENT_TYPES: [&str; 3] = ["birthright", "lcm", "batch"];

/// Shape of the generated extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    #[serde(default = "default_supervisors")]
    pub supervisors: usize,
    #[serde(default = "default_users_per_supervisor")]
    pub users_per_supervisor: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_supervisors() -> usize {
    5
}

fn default_users_per_supervisor() -> usize {
    40
}

fn default_seed() -> u64 {
    42
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            supervisors: default_supervisors(),
            users_per_supervisor: default_users_per_supervisor(),
            seed: default_seed(),
        }
    }
}

impl SyntheticConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

fn role_family(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{}_{}", prefix, i)).collect()
}

/// Generate an extract; the same config always yields the same rows
pub fn generate(config: &SyntheticConfig) -> Dataset {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let core_roles = role_family("AR_CORE", 7);
    let finance_roles = role_family("AR_FIN", 5);
    let ops_roles = role_family("AR_OPS", 5);
    let misc_roles = role_family("AR_MISC", 9);

    let mut records = Vec::new();
    for s in 1..=config.supervisors {
        let supervisor = format!("SH_L6_{}", s);
        let core_bundle: Vec<&String> = core_roles.choose_multiple(&mut rng, 3).collect();

        for u in 1..=config.users_per_supervisor {
            let user_id = format!("{}_U{:03}", supervisor, u);
            let job_code = JOB_CODES[rng.gen_range(0..JOB_CODES.len())];
            let assignment = ASSIGNMENT_TYPES[rng.gen_range(0..ASSIGNMENT_TYPES.len())];
            let department = if job_code.starts_with("JC1") { "FIN" } else { "OPS" };

            let mut roles: BTreeSet<&str> = BTreeSet::new();
            for role in &core_bundle {
                if assignment == "birthright" || rng.gen_bool(0.6) {
                    roles.insert(role.as_str());
                }
            }

            let family = if department == "FIN" { &finance_roles } else { &ops_roles };
            let picked: Vec<&String> = family.choose_multiple(&mut rng, 2).collect();
            for role in picked {
                if rng.gen_bool(0.8) {
                    roles.insert(role.as_str());
                }
            }

            if rng.gen_bool(0.3) {
                if let Some(role) = misc_roles.choose(&mut rng) {
                    roles.insert(role.as_str());
                }
            }

            for role in roles {
                records.push(
                    AccessRecord::new(&user_id, role)
                        .with_assignment_type(assignment)
                        .with_job_code(job_code)
                        .with_department(department)
                        .with_supervisor_group(&supervisor),
                );
            }
        }
    }

    debug!(seed = config.seed, rows = records.len(), "synthetic extract generated");
    Dataset::new(Column::ALL, records)
}
