//! CSV ingestion boundary
//!
//! Turns a flat extract into a [`Dataset`]. This is where raw values are
//! normalized: aliases resolve to canonical columns, attribute values are
//! trimmed and blank assignment types become `None`, so the engines never
//! branch on input shape.

use std::collections::BTreeSet;
use std::io::Read;

use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{AccessRecord, Column, Dataset};

/// Read an extract with a header row
///
/// Unknown header names are ignored. Rows whose declared `user_id` or
/// `role_name` is blank are skipped.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut positions: Vec<(Column, usize)> = Vec::new();
    for (index, name) in headers.iter().enumerate() {
        match name.parse::<Column>() {
            Ok(column) if !positions.iter().any(|(c, _)| *c == column) => {
                positions.push((column, index));
            }
            Ok(column) => debug!("duplicate column '{}' ignored", column),
            Err(_) => debug!("ignoring unknown column '{}'", name),
        }
    }

    let declared: BTreeSet<Column> = positions.iter().map(|(c, _)| *c).collect();
    let missing: Vec<&str> = Column::ALL
        .iter()
        .filter(|c| !declared.contains(c))
        .map(|c| c.as_str())
        .collect();
    if !missing.is_empty() {
        warn!("extract is missing columns: {}", missing.join(", "));
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in csv_reader.records() {
        let row = row?;
        let field = |column: Column| -> String {
            positions
                .iter()
                .find(|(c, _)| *c == column)
                .and_then(|(_, index)| row.get(*index))
                .unwrap_or("")
                .to_string()
        };

        let record = AccessRecord::new(field(Column::UserId), field(Column::RoleName))
            .with_assignment_type(field(Column::AssignmentType))
            .with_job_code(field(Column::JobCode))
            .with_department(field(Column::Department))
            .with_supervisor_group(field(Column::SupervisorGroup));

        let blank_user = declared.contains(&Column::UserId) && record.user_id.is_empty();
        let blank_role = declared.contains(&Column::RoleName) && record.role_name.is_empty();
        if blank_user || blank_role {
            skipped += 1;
            continue;
        }
        records.push(record);
    }

    debug!(rows = records.len(), skipped, "extract loaded");
    Ok(Dataset::new(declared, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_with_aliases() {
        let data = "\
user_id,ar_role_name,assignment_type,job_code,department,supervisor_level6
U1,AR_CORE_1,birthright,JC101,FIN,SH_L6_1
U1,AR_FIN_2,,JC101,FIN,SH_L6_1
U2, AR_CORE_1 ,lcm,JC201,OPS,SH_L6_2
";
        let ds = read_csv(data.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert!(ds.missing_columns(&Column::ALL).is_empty());

        let rows = ds.records();
        assert_eq!(rows[0].supervisor_group, "SH_L6_1");
        assert_eq!(rows[1].assignment_type, None);
        assert_eq!(rows[2].role_name, "AR_CORE_1");
    }

    #[test]
    fn test_missing_columns_are_declared_absent() {
        let data = "user_id,role_name,extra\nU1,R1,x\n";
        let ds = read_csv(data.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
        assert!(!ds.has_column(Column::JobCode));
        assert_eq!(ds.records()[0].job_code, "");
    }

    #[test]
    fn test_blank_rows_skipped() {
        let data = "user_id,role_name\nU1,R1\n,R2\nU3,\n";
        let ds = read_csv(data.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
    }
}
