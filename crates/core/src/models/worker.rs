use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ReportError;

/// 负责处理报修单的部门
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Department {
    #[serde(rename = "maintenance")]
    Maintenance,
    #[serde(rename = "systems")]
    Systems,
}

impl Department {
    pub const ALL: [Department; 2] = [Department::Maintenance, Department::Systems];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Maintenance => "maintenance",
            Department::Systems => "systems",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "maintenance" => Ok(Department::Maintenance),
            "systems" => Ok(Department::Systems),
            other => Err(ReportError::validation_error(format!(
                "无效的部门: {other}，支持的部门: maintenance, systems"
            ))),
        }
    }
}

/// 维修人员，由外部名册维护，这里只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub department: Department,
    pub rank: String,
    pub contact: String,
}

impl Worker {
    pub fn new(
        id: impl Into<String>,
        department: Department,
        rank: impl Into<String>,
        contact: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            department,
            rank: rank.into(),
            contact: contact.into(),
        }
    }

    pub fn belongs_to(&self, department: Department) -> bool {
        self.department == department
    }
}
