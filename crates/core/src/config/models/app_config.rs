use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    collaborators::{AlertConfig, NotifierConfig, ObjectStoreConfig},
    database::DatabaseConfig,
    limits::LimitsConfig,
    workflow::{AssignmentConfig, CallConfig, LifecycleConfig, LoggingConfig},
};

/// System configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub object_store: ObjectStoreConfig,
    pub notifier: NotifierConfig,
    pub alerts: AlertConfig,
    pub assignment: AssignmentConfig,
    pub limits: LimitsConfig,
    pub lifecycle: LifecycleConfig,
    pub calls: CallConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: REPORTS__)
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = ConfigBuilder::try_from(&AppConfig::default()).context("构建默认配置失败")?;
        let mut builder = ConfigBuilder::builder().add_source(defaults);

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = ["config/reports.toml", "reports.toml"];
            if let Some(path) = default_paths.iter().find(|p| Path::new(p).exists()) {
                builder = builder.add_source(File::new(*path, FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("REPORTS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    /// Validate configuration effectiveness
    pub fn validate(&self) -> Result<()> {
        self.database.validate().context("数据库配置验证失败")?;
        self.object_store
            .validate()
            .context("对象存储配置验证失败")?;
        self.notifier.validate().context("通知配置验证失败")?;
        self.limits.validate().context("输入限制配置验证失败")?;
        self.calls.validate().context("远程调用配置验证失败")?;
        self.logging.validate().context("日志配置验证失败")?;

        Ok(())
    }
}
