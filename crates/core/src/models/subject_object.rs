use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ReportError;

/// 报修对象的类别（封闭集合）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ObjectCategory {
    #[serde(rename = "furniture")]
    Furniture,
    #[serde(rename = "electrical")]
    Electrical,
    #[serde(rename = "plumbing")]
    Plumbing,
    #[serde(rename = "lighting")]
    Lighting,
    #[serde(rename = "climate")]
    Climate,
    #[serde(rename = "computer")]
    Computer,
    #[serde(rename = "network")]
    Network,
    #[serde(rename = "printer")]
    Printer,
    #[serde(rename = "projector")]
    Projector,
    #[serde(rename = "other")]
    Other,
}

impl ObjectCategory {
    pub const ALL: [ObjectCategory; 10] = [
        ObjectCategory::Furniture,
        ObjectCategory::Electrical,
        ObjectCategory::Plumbing,
        ObjectCategory::Lighting,
        ObjectCategory::Climate,
        ObjectCategory::Computer,
        ObjectCategory::Network,
        ObjectCategory::Printer,
        ObjectCategory::Projector,
        ObjectCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectCategory::Furniture => "furniture",
            ObjectCategory::Electrical => "electrical",
            ObjectCategory::Plumbing => "plumbing",
            ObjectCategory::Lighting => "lighting",
            ObjectCategory::Climate => "climate",
            ObjectCategory::Computer => "computer",
            ObjectCategory::Network => "network",
            ObjectCategory::Printer => "printer",
            ObjectCategory::Projector => "projector",
            ObjectCategory::Other => "other",
        }
    }
}

impl fmt::Display for ObjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectCategory {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ObjectCategory::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| ReportError::validation_error(format!("无效的报修对象类别: {s}")))
    }
}

/// 报修对象：报修单所针对的设备或设施，与报修单一一对应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectObject {
    pub id: i64,
    pub name: String,
    pub category: ObjectCategory,
    pub place_id: i64,
    pub report_id: i64,
}

impl SubjectObject {
    pub fn new(
        name: impl Into<String>,
        category: ObjectCategory,
        place_id: i64,
        report_id: i64,
    ) -> Self {
        Self {
            id: 0, // 将由存储生成
            name: name.into(),
            category,
            place_id,
            report_id,
        }
    }
}
