//! Cohort grouping keys
//!
//! A group key is the ordered tuple of categorical values a set of records
//! shares over the configured grouping columns (e.g. supervisor × job code).

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::record::{AccessRecord, Column};

/// Canonical key of a cohort: `(column, value)` pairs in grouping order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    parts: Vec<(Column, String)>,
}

impl GroupKey {
    /// Build the key of `record` over `columns`
    pub fn of(record: &AccessRecord, columns: &[Column]) -> Self {
        Self {
            parts: columns
                .iter()
                .map(|&column| (column, record.value(column).to_string()))
                .collect(),
        }
    }

    /// Build a key from explicit parts
    pub fn from_parts(parts: Vec<(Column, String)>) -> Self {
        Self { parts }
    }

    /// Key parts in grouping order
    pub fn parts(&self) -> &[(Column, String)] {
        &self.parts
    }

    /// Value of a grouping column, if the key covers it
    pub fn get(&self, column: Column) -> Option<&str> {
        self.parts
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v.as_str())
    }

    /// Whether any grouping column has a blank value
    pub fn has_blank_part(&self) -> bool {
        self.parts.iter().any(|(_, v)| v.is_empty())
    }

    /// Group records by `columns`, keeping the records of each group in input order
    pub fn group<'a>(
        records: impl IntoIterator<Item = &'a AccessRecord>,
        columns: &[Column],
    ) -> BTreeMap<GroupKey, Vec<&'a AccessRecord>> {
        let mut groups: BTreeMap<GroupKey, Vec<&'a AccessRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry(GroupKey::of(record, columns))
                .or_default()
                .push(record);
        }
        groups
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .parts
            .iter()
            .map(|(column, value)| format!("{}={}", column, value))
            .collect();
        write!(f, "{}", rendered.join(", "))
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.parts.len()))?;
        for (column, value) in &self.parts {
            map.serialize_entry(column.as_str(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: &str, sup: &str, job: &str) -> AccessRecord {
        AccessRecord::new(user, "R1")
            .with_supervisor_group(sup)
            .with_job_code(job)
    }

    #[test]
    fn test_group_by_multi_key() {
        let records = vec![
            record("U1", "S1", "J1"),
            record("U2", "S1", "J2"),
            record("U3", "S1", "J1"),
            record("U4", "S2", "J1"),
        ];

        let groups = GroupKey::group(&records, &[Column::SupervisorGroup, Column::JobCode]);
        assert_eq!(groups.len(), 3);

        let key = GroupKey::from_parts(vec![
            (Column::SupervisorGroup, "S1".to_string()),
            (Column::JobCode, "J1".to_string()),
        ]);
        let members: Vec<&str> = groups[&key].iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(members, vec!["U1", "U3"]);
    }

    #[test]
    fn test_key_display_and_lookup() {
        let key = GroupKey::of(&record("U1", "S1", "J1"), &[Column::SupervisorGroup, Column::JobCode]);
        assert_eq!(key.to_string(), "supervisor_group=S1, job_code=J1");
        assert_eq!(key.get(Column::JobCode), Some("J1"));
        assert_eq!(key.get(Column::Department), None);
    }

    #[test]
    fn test_blank_part_detection() {
        let columns = [Column::SupervisorGroup, Column::JobCode];
        let keyed = AccessRecord::new("U1", "R1")
            .with_supervisor_group("S1")
            .with_job_code("J1");
        assert!(!GroupKey::of(&keyed, &columns).has_blank_part());

        let unkeyed = AccessRecord::new("U2", "R1").with_job_code("J1");
        assert!(GroupKey::of(&unkeyed, &columns).has_blank_part());
    }

    #[test]
    fn test_key_serializes_as_ordered_map() {
        let key = GroupKey::of(&record("U1", "S1", "J1"), &[Column::SupervisorGroup, Column::JobCode]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"{"supervisor_group":"S1","job_code":"J1"}"#);
    }
}
