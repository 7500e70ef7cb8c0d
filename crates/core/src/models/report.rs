use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ReportError;
use crate::models::{Place, SubjectObject};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReportStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "RESOLVED")]
    Resolved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::InProgress => "IN_PROGRESS",
            ReportStatus::Resolved => "RESOLVED",
        }
    }

    /// 正常推进时的直接后继状态
    pub fn successor(&self) -> Option<ReportStatus> {
        match self {
            ReportStatus::Pending => Some(ReportStatus::InProgress),
            ReportStatus::InProgress => Some(ReportStatus::Resolved),
            ReportStatus::Resolved => None,
        }
    }

    pub fn can_advance_to(&self, target: ReportStatus) -> bool {
        self.successor() == Some(target)
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, ReportStatus::Resolved)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "PENDING" => Ok(ReportStatus::Pending),
            "IN_PROGRESS" | "INPROGRESS" => Ok(ReportStatus::InProgress),
            "RESOLVED" => Ok(ReportStatus::Resolved),
            _ => Err(ReportError::validation_error(format!("无效的报修单状态: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportPriority {
    #[serde(rename = "UNASSIGNED")]
    Unassigned,
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "URGENT")]
    Urgent,
}

impl ReportPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPriority::Unassigned => "UNASSIGNED",
            ReportPriority::Low => "LOW",
            ReportPriority::Medium => "MEDIUM",
            ReportPriority::High => "HIGH",
            ReportPriority::Urgent => "URGENT",
        }
    }

    /// 维修人员可以设置的优先级（不含 Unassigned）
    pub fn is_assignable(&self) -> bool {
        !matches!(self, ReportPriority::Unassigned)
    }
}

impl fmt::Display for ReportPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportPriority {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNASSIGNED" => Ok(ReportPriority::Unassigned),
            "LOW" => Ok(ReportPriority::Low),
            "MEDIUM" => Ok(ReportPriority::Medium),
            "HIGH" => Ok(ReportPriority::High),
            "URGENT" => Ok(ReportPriority::Urgent),
            _ => Err(ReportError::validation_error(format!("无效的优先级: {s}"))),
        }
    }
}

/// 报修单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub status: ReportStatus,
    pub priority: ReportPriority,
    pub comment: String,
    pub attachment_refs: Vec<String>,
    pub assigned_worker_id: Option<String>,
    pub creator_id: String,
}

impl Report {
    /// 新建报修单：待处理、未定优先级、无备注、无附件
    pub fn new(
        description: impl Into<String>,
        creator_id: impl Into<String>,
        assigned_worker_id: Option<String>,
    ) -> Self {
        Self {
            id: 0, // 将由存储生成
            created_at: Utc::now(),
            description: description.into(),
            status: ReportStatus::Pending,
            priority: ReportPriority::Unassigned,
            comment: String::new(),
            attachment_refs: Vec::new(),
            assigned_worker_id,
            creator_id: creator_id.into(),
        }
    }

    pub fn is_assigned_to(&self, worker_id: &str) -> bool {
        self.assigned_worker_id.as_deref() == Some(worker_id)
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// 生命周期字段（状态、优先级、备注、维修人员）是否与另一份快照一致
    pub fn same_lifecycle_state(&self, other: &Report) -> bool {
        self.status == other.status
            && self.priority == other.priority
            && self.comment == other.comment
            && self.assigned_worker_id == other.assigned_worker_id
    }

    pub fn entity_description(&self) -> String {
        match &self.assigned_worker_id {
            Some(worker_id) => format!(
                "报修单 (ID: {}, 状态: {}, 维修人员: {})",
                self.id, self.status, worker_id
            ),
            None => format!("报修单 (ID: {}, 状态: {}, 未分配)", self.id, self.status),
        }
    }
}

/// 报修单与创建者的关联，"我的报修" 查询通过它完成
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCreatorLink {
    pub report_id: i64,
    pub creator_id: String,
}

impl ReportCreatorLink {
    pub fn new(report_id: i64, creator_id: impl Into<String>) -> Self {
        Self {
            report_id,
            creator_id: creator_id.into(),
        }
    }
}

/// 报修单及其报修对象和场所
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDetails {
    pub report: Report,
    pub subject_object: Option<SubjectObject>,
    pub place: Option<Place>,
}
