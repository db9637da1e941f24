//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use brb_core::{AccessRecord, Dataset};

/// Builder for cohort-shaped extracts
#[derive(Default)]
pub struct ExtractBuilder {
    records: Vec<AccessRecord>,
}

impl ExtractBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `users` users to supervisor group `sup` × job code `job`
    ///
    /// The first `holders` users hold every role in `roles`; the rest hold
    /// only `AR_MISC_1`, so every user appears in the extract.
    pub fn cohort(mut self, sup: &str, job: &str, users: usize, holders: usize, roles: &[&str]) -> Self {
        for u in 0..users {
            let user = format!("{}_{}_U{:03}", sup, job, u);
            if u < holders {
                for role in roles {
                    self.records.push(record(&user, role, sup, job));
                }
            } else {
                self.records.push(record(&user, "AR_MISC_1", sup, job));
            }
        }
        self
    }

    /// Give the named user one more role
    pub fn grant(mut self, user: &str, role: &str, sup: &str, job: &str) -> Self {
        self.records.push(record(user, role, sup, job));
        self
    }

    pub fn push(mut self, record: AccessRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn build(self) -> Dataset {
        Dataset::from_records(self.records)
    }
}

pub fn record(user: &str, role: &str, sup: &str, job: &str) -> AccessRecord {
    AccessRecord::new(user, role)
        .with_supervisor_group(sup)
        .with_job_code(job)
        .with_department(if job.starts_with("JC1") { "FIN" } else { "OPS" })
        .with_assignment_type("lcm")
}

/// Cohort user id produced by [`ExtractBuilder::cohort`]
pub fn cohort_user(sup: &str, job: &str, index: usize) -> String {
    format!("{}_{}_U{:03}", sup, job, index)
}
