use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategyKind {
    /// 在部门内均匀随机选择，无状态
    Random,
    /// 选择未解决报修单最少的维修人员
    LeastLoaded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentConfig {
    pub strategy: AssignmentStrategyKind,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            strategy: AssignmentStrategyKind::Random,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// 是否允许把已解决的报修单重新打开
    pub allow_reopen: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self { allow_reopen: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallConfig {
    pub remote_call_timeout_seconds: u64,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            remote_call_timeout_seconds: 15,
        }
    }
}

impl CallConfig {
    pub fn remote_call_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_call_timeout_seconds)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.remote_call_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("远程调用超时时间必须大于0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(anyhow::anyhow!(
                "无效的日志级别: {}，支持的级别: {:?}",
                self.level,
                valid_levels
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(anyhow::anyhow!(
                "无效的日志格式: {}，支持的格式: {:?}",
                self.format,
                valid_formats
            ));
        }

        Ok(())
    }
}
