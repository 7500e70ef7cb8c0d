use std::path::PathBuf;

use async_trait::async_trait;
use reports_core::{ConsistencyAlert, ConsistencyAlertSink, ReportError, ReportResult};
use tokio::io::AsyncWriteExt;
use tracing::error;

/// 以 error 级别日志发出一致性告警，可选地追加到 JSON Lines 文件供运维队列消费
pub struct LogAlertSink {
    journal: Option<PathBuf>,
}

impl LogAlertSink {
    pub fn new() -> Self {
        Self { journal: None }
    }

    pub fn with_journal(path: impl Into<PathBuf>) -> Self {
        Self {
            journal: Some(path.into()),
        }
    }

    async fn append(&self, path: &PathBuf, alert: &ConsistencyAlert) -> ReportResult<()> {
        let mut line = serde_json::to_string(alert)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| ReportError::dependency("alerts.journal", e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| ReportError::dependency("alerts.journal", e.to_string()))?;
        Ok(())
    }
}

impl Default for LogAlertSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConsistencyAlertSink for LogAlertSink {
    async fn raise(&self, alert: &ConsistencyAlert) -> ReportResult<()> {
        error!(
            report_id = alert.report_id,
            orphaned = ?alert.orphaned_records,
            cause = %alert.cause,
            compensation_error = %alert.compensation_error,
            "数据一致性告警: 补偿失败，存在孤立记录，需要人工处理"
        );

        if let Some(path) = &self.journal {
            self.append(path, alert).await?;
        }
        Ok(())
    }
}
