use thiserror::Error;

use crate::models::ReportStatus;

/// 报修系统错误类型定义
#[derive(Debug, Clone, Error)]
pub enum ReportError {
    #[error("数据验证失败: {0}")]
    Validation(String),

    #[error("依赖服务不可用: {operation} - {message}")]
    DependencyUnavailable { operation: String, message: String },

    #[error("操作超时: {0}")]
    Timeout(String),

    #[error("操作已取消: {0}")]
    Cancelled(String),

    #[error("数据一致性被破坏: 报修单 {report_id} 补偿失败 - {message}")]
    ConsistencyViolation {
        report_id: i64,
        orphaned: Vec<String>,
        message: String,
    },

    #[error("无效的状态迁移: 报修单 {report_id} 从 {from} 到 {to} - {reason}")]
    InvalidTransition {
        report_id: i64,
        from: ReportStatus,
        to: ReportStatus,
        reason: String,
    },

    #[error("权限不足: {0}")]
    Permission(String),

    #[error("报修单未找到: {id}")]
    ReportNotFound { id: i64 },

    #[error("维修人员未找到: {id}")]
    WorkerNotFound { id: String },

    #[error("唯一约束冲突: {0}")]
    Conflict(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 统一的Result类型
pub type ReportResult<T> = std::result::Result<T, ReportError>;

impl ReportError {
    pub fn validation_error<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
    pub fn dependency<O: Into<String>, M: Into<String>>(operation: O, message: M) -> Self {
        Self::DependencyUnavailable {
            operation: operation.into(),
            message: message.into(),
        }
    }
    pub fn timeout_error<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }
    pub fn permission<S: Into<String>>(msg: S) -> Self {
        Self::Permission(msg.into())
    }
    pub fn report_not_found(id: i64) -> Self {
        Self::ReportNotFound { id }
    }
    pub fn worker_not_found<S: Into<String>>(id: S) -> Self {
        Self::WorkerNotFound { id: id.into() }
    }
    pub fn invalid_transition<S: Into<String>>(
        report_id: i64,
        from: ReportStatus,
        to: ReportStatus,
        reason: S,
    ) -> Self {
        Self::InvalidTransition {
            report_id,
            from,
            to,
            reason: reason.into(),
        }
    }

    /// 调用方输入或操作顺序有误，应直接反馈给用户修正
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ReportError::Validation(_)
                | ReportError::InvalidTransition { .. }
                | ReportError::Permission(_)
                | ReportError::ReportNotFound { .. }
                | ReportError::WorkerNotFound { .. }
        )
    }

    /// 可以作为一次全新的操作整体重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReportError::DependencyUnavailable { .. }
                | ReportError::Timeout(_)
                | ReportError::Cancelled(_)
        )
    }

    pub fn is_dependency_failure(&self) -> bool {
        self.is_retryable()
    }

    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, ReportError::ConsistencyViolation { .. })
    }

    pub fn user_message(&self) -> &str {
        match self {
            ReportError::Validation(_) => "输入数据验证失败",
            ReportError::InvalidTransition { .. } => "报修单当前状态不允许此操作",
            ReportError::Permission(_) => "您没有执行此操作的权限",
            ReportError::ReportNotFound { .. } => "请求的报修单不存在",
            ReportError::WorkerNotFound { .. } => "请求的维修人员不存在",
            ReportError::Timeout(_) => "操作超时，请稍后重试",
            ReportError::Cancelled(_) => "操作已取消",
            ReportError::ConsistencyViolation { .. } => {
                "报修数据出现不一致，已通知运维人员处理"
            }
            _ => "系统繁忙，请稍后重试",
        }
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for ReportError {
    fn from(err: anyhow::Error) -> Self {
        ReportError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ReportError::validation_error("empty").is_caller_error());
        assert!(ReportError::permission("not owner").is_caller_error());
        assert!(ReportError::invalid_transition(
            1,
            ReportStatus::Pending,
            ReportStatus::Resolved,
            "skip"
        )
        .is_caller_error());

        let dependency = ReportError::dependency("create_report", "connection refused");
        assert!(dependency.is_retryable());
        assert!(!dependency.is_caller_error());
        assert!(ReportError::timeout_error("slow").is_retryable());
        assert!(!ReportError::Conflict("dup".into()).is_retryable());
    }

    #[test]
    fn test_consistency_violation_is_loud() {
        let err = ReportError::ConsistencyViolation {
            report_id: 42,
            orphaned: vec!["report:42".to_string()],
            message: "delete failed".to_string(),
        };
        assert!(err.is_consistency_violation());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("42"));
        assert_ne!(err.user_message(), "系统繁忙，请稍后重试");
    }

    #[test]
    fn test_from_serde_error() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ReportError = parse.unwrap_err().into();
        assert!(matches!(err, ReportError::Serialization(_)));
    }
}
