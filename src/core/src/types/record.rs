//! Access record and column definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A column of the access extract
///
/// Column names are matched case-sensitively. The extract aliases
/// `ar_role_name` and `supervisor_level6` resolve to their canonical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    UserId,
    #[serde(alias = "ar_role_name")]
    RoleName,
    AssignmentType,
    JobCode,
    Department,
    #[serde(alias = "supervisor_level6")]
    SupervisorGroup,
}

impl Column {
    /// Every column, in extract order
    pub const ALL: [Column; 6] = [
        Column::UserId,
        Column::RoleName,
        Column::AssignmentType,
        Column::JobCode,
        Column::Department,
        Column::SupervisorGroup,
    ];

    /// Canonical column name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserId => "user_id",
            Self::RoleName => "role_name",
            Self::AssignmentType => "assignment_type",
            Self::JobCode => "job_code",
            Self::Department => "department",
            Self::SupervisorGroup => "supervisor_group",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_id" => Ok(Self::UserId),
            "role_name" | "ar_role_name" => Ok(Self::RoleName),
            "assignment_type" => Ok(Self::AssignmentType),
            "job_code" => Ok(Self::JobCode),
            "department" => Ok(Self::Department),
            "supervisor_group" | "supervisor_level6" => Ok(Self::SupervisorGroup),
            other => Err(CoreError::invalid(format!("unknown column '{}'", other))),
        }
    }
}

/// One user-role assignment row of the extract
///
/// A user appears once per role held. Categorical attributes absent from the
/// extract are empty strings; `assignment_type` is normalized at ingestion so
/// blank values become `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub user_id: String,
    pub role_name: String,
    #[serde(default)]
    pub assignment_type: Option<String>,
    #[serde(default)]
    pub job_code: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub supervisor_group: String,
}

impl AccessRecord {
    /// Create a record for a user-role assignment with empty attributes
    pub fn new(user_id: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role_name: role_name.into(),
            assignment_type: None,
            job_code: String::new(),
            department: String::new(),
            supervisor_group: String::new(),
        }
    }

    /// Set the assignment type (blank values are dropped)
    pub fn with_assignment_type(mut self, assignment_type: impl Into<String>) -> Self {
        self.assignment_type = normalize_assignment_type(assignment_type.into());
        self
    }

    /// Set the job code
    pub fn with_job_code(mut self, job_code: impl Into<String>) -> Self {
        self.job_code = job_code.into();
        self
    }

    /// Set the department
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    /// Set the supervisor group
    pub fn with_supervisor_group(mut self, supervisor_group: impl Into<String>) -> Self {
        self.supervisor_group = supervisor_group.into();
        self
    }

    /// Value of a column for this record
    pub fn value(&self, column: Column) -> &str {
        match column {
            Column::UserId => &self.user_id,
            Column::RoleName => &self.role_name,
            Column::AssignmentType => self.assignment_type.as_deref().unwrap_or(""),
            Column::JobCode => &self.job_code,
            Column::Department => &self.department,
            Column::SupervisorGroup => &self.supervisor_group,
        }
    }
}

/// Trim an assignment type, mapping blank values to `None`
pub fn normalize_assignment_type(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == raw.len() {
        Some(raw)
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_parsing() {
        assert_eq!("user_id".parse::<Column>().unwrap(), Column::UserId);
        assert_eq!("ar_role_name".parse::<Column>().unwrap(), Column::RoleName);
        assert_eq!(
            "supervisor_level6".parse::<Column>().unwrap(),
            Column::SupervisorGroup
        );
        assert!("User_Id".parse::<Column>().is_err());
    }

    #[test]
    fn test_record_builder() {
        let record = AccessRecord::new("U1", "AR_CORE_1")
            .with_job_code("JC101")
            .with_department("FIN")
            .with_supervisor_group("S1")
            .with_assignment_type("  birthright ");

        assert_eq!(record.value(Column::JobCode), "JC101");
        assert_eq!(record.value(Column::SupervisorGroup), "S1");
        assert_eq!(record.assignment_type.as_deref(), Some("birthright"));
    }

    #[test]
    fn test_blank_assignment_type() {
        let record = AccessRecord::new("U1", "R1").with_assignment_type("   ");
        assert_eq!(record.assignment_type, None);
        assert_eq!(record.value(Column::AssignmentType), "");
    }
}
