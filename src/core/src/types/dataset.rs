//! Dataset snapshot and snapshot store
//!
//! A [`Dataset`] is the immutable in-memory form of one access extract: the
//! set of columns the extract declared plus its rows in source order.
//! [`DatasetStore`] holds the current snapshot for concurrent readers; a
//! reload swaps the whole snapshot so readers never see a partial write.

use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::record::{AccessRecord, Column};
use super::user_roles::UserRoleSets;

/// Immutable access extract
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: BTreeSet<Column>,
    records: Vec<AccessRecord>,
}

impl Dataset {
    /// Create a dataset with an explicit column declaration
    pub fn new(columns: impl IntoIterator<Item = Column>, records: Vec<AccessRecord>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            records,
        }
    }

    /// Create a dataset that declares every column
    pub fn from_records(records: Vec<AccessRecord>) -> Self {
        Self::new(Column::ALL, records)
    }

    pub fn records(&self) -> &[AccessRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Declared columns
    pub fn columns(&self) -> &BTreeSet<Column> {
        &self.columns
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Columns from `required` that the extract did not declare
    pub fn missing_columns(&self, required: &[Column]) -> Vec<Column> {
        required
            .iter()
            .copied()
            .filter(|column| !self.columns.contains(column))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of distinct users
    pub fn user_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.user_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Role sets of every user in the dataset
    pub fn user_role_sets(&self) -> UserRoleSets {
        UserRoleSets::from_records(&self.records)
    }

    /// Records of a single user, in source order
    pub fn records_for_user<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a AccessRecord> {
        self.records.iter().filter(move |r| r.user_id == user_id)
    }

    /// Sub-dataset keeping rows that match `filter`; the column declaration is preserved
    pub fn filter(&self, filter: &RecordFilter) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            records: self
                .records
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect(),
        }
    }
}

/// Optional equality filters over categorical attributes
///
/// Unset (or blank) fields do not constrain. Set fields are compared after
/// trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub supervisor_group: Option<String>,
    pub department: Option<String>,
    pub job_code: Option<String>,
    pub assignment_type: Option<String>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_supervisor_group(mut self, value: impl Into<String>) -> Self {
        self.supervisor_group = Some(value.into());
        self
    }

    pub fn with_department(mut self, value: impl Into<String>) -> Self {
        self.department = Some(value.into());
        self
    }

    pub fn with_job_code(mut self, value: impl Into<String>) -> Self {
        self.job_code = Some(value.into());
        self
    }

    pub fn with_assignment_type(mut self, value: impl Into<String>) -> Self {
        self.assignment_type = Some(value.into());
        self
    }

    /// Whether `record` satisfies every active constraint
    pub fn matches(&self, record: &AccessRecord) -> bool {
        Self::accepts(&self.supervisor_group, &record.supervisor_group)
            && Self::accepts(&self.department, &record.department)
            && Self::accepts(&self.job_code, &record.job_code)
            && Self::accepts(
                &self.assignment_type,
                record.assignment_type.as_deref().unwrap_or(""),
            )
    }

    /// Active constraint value, `None` when unset or blank
    pub fn active(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    fn accepts(constraint: &Option<String>, actual: &str) -> bool {
        match Self::active(constraint) {
            Some(expected) => actual == expected,
            None => true,
        }
    }
}

/// Holder of the current dataset snapshot
///
/// Readers take an `Arc` to the snapshot and compute against it without
/// holding the lock. `replace` swaps in a whole new snapshot.
#[derive(Debug, Default)]
pub struct DatasetStore {
    current: RwLock<Arc<Dataset>>,
}

impl DatasetStore {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            current: RwLock::new(Arc::new(dataset)),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&self.current.read())
    }

    /// Swap in a new snapshot, returning the previous one
    pub fn replace(&self, dataset: Dataset) -> Arc<Dataset> {
        let next = Arc::new(dataset);
        let previous = std::mem::replace(&mut *self.current.write(), next);
        tracing::debug!(
            previous_rows = previous.len(),
            rows = self.current.read().len(),
            "dataset snapshot replaced"
        );
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn sample() -> Dataset {
        Dataset::from_records(vec![
            AccessRecord::new("U1", "R1")
                .with_job_code("J1")
                .with_department("FIN")
                .with_supervisor_group("S1")
                .with_assignment_type("birthright"),
            AccessRecord::new("U1", "R2")
                .with_job_code("J1")
                .with_department("FIN")
                .with_supervisor_group("S1"),
            AccessRecord::new("U2", "R1")
                .with_job_code("J2")
                .with_department("OPS")
                .with_supervisor_group("S1")
                .with_assignment_type("lcm"),
        ])
    }

    #[test]
    fn test_missing_columns() {
        let ds = Dataset::new([Column::UserId, Column::RoleName], Vec::new());
        assert_eq!(
            ds.missing_columns(&[Column::UserId, Column::JobCode, Column::SupervisorGroup]),
            vec![Column::JobCode, Column::SupervisorGroup]
        );
        assert!(sample().missing_columns(&Column::ALL).is_empty());
    }

    #[test]
    fn test_filter() {
        let ds = sample();
        let fin = ds.filter(&RecordFilter::new().with_department("FIN"));
        assert_eq!(fin.len(), 2);
        assert_eq!(fin.user_count(), 1);

        let blank = ds.filter(&RecordFilter::new().with_job_code("  "));
        assert_eq!(blank.len(), 3);

        let lcm = ds.filter(&RecordFilter::new().with_assignment_type("lcm"));
        assert_eq!(lcm.len(), 1);
        assert_eq!(lcm.records()[0].user_id, "U2");
    }

    #[test]
    fn test_records_for_user() {
        let ds = sample();
        assert_eq!(ds.records_for_user("U1").count(), 2);
        assert_eq!(ds.records_for_user("missing").count(), 0);
    }

    #[test]
    fn test_store_replace_keeps_old_snapshot_intact() {
        let store = DatasetStore::new(sample());
        let before = store.snapshot();

        let previous = store.replace(Dataset::default());
        assert_eq!(previous.len(), 3);
        assert_eq!(before.len(), 3);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_store_concurrent_readers() {
        let store = Arc::new(DatasetStore::new(sample()));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let snapshot = store.snapshot();
                        // A snapshot is either the full sample or the full replacement
                        assert!(snapshot.len() == 3 || snapshot.len() == 1);
                    }
                })
            })
            .collect();

        store.replace(Dataset::from_records(vec![AccessRecord::new("U9", "R9")]));

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
