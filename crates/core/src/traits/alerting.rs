use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ReportResult;

/// 补偿失败后遗留的孤立记录告警，需要运维人员介入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyAlert {
    pub report_id: i64,
    pub orphaned_records: Vec<String>,
    pub cause: String,
    pub compensation_error: String,
    pub raised_at: DateTime<Utc>,
}

impl ConsistencyAlert {
    pub fn new(
        report_id: i64,
        orphaned_records: Vec<String>,
        cause: impl Into<String>,
        compensation_error: impl Into<String>,
    ) -> Self {
        Self {
            report_id,
            orphaned_records,
            cause: cause.into(),
            compensation_error: compensation_error.into(),
            raised_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait ConsistencyAlertSink: Send + Sync {
    async fn raise(&self, alert: &ConsistencyAlert) -> ReportResult<()>;
}
