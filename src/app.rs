use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use reports_application::{
    InputValidator, ReportLifecycleController, ReportOrchestrator, ReportQueries,
};
use reports_core::config::AppConfig;
use reports_core::{
    AuthorityCheck, CallContext, ConsistencyAlertSink, Notifier, ObjectStore, RecordStore,
};
use reports_dispatcher::AssignmentSelector;
use reports_infrastructure::{
    build_notifier, DatabaseManager, LocalObjectStore, LogAlertSink, RosterAuthority,
};
use tracing::info;

/// 报修系统应用程序
///
/// 按配置装配记录存储、对象存储、通知器和分配策略，持有三个用例服务。
/// 除数据库连接池外不保存跨调用状态。
pub struct Application {
    config: AppConfig,
    database: DatabaseManager,
    store: RecordStore,
    orchestrator: ReportOrchestrator,
    lifecycle: ReportLifecycleController,
    queries: ReportQueries,
}

impl Application {
    /// 创建新的应用实例，数据库表不存在时自动创建
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("初始化报修系统");

        ensure_database_dir(&config.database.url)?;
        let database = DatabaseManager::new(&config.database).await?;
        database.migrate().await?;

        Self::with_database(config, database)
    }

    /// 使用已经建好的数据库创建应用实例
    pub fn with_database(config: AppConfig, database: DatabaseManager) -> Result<Self> {
        let store = database.record_store();

        let selector = Arc::new(AssignmentSelector::from_kind(
            config.assignment.strategy,
            Arc::clone(&store.workers),
            Arc::clone(&store.reports),
        ));
        info!("分配策略: {}", selector.strategy_name());

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(LocalObjectStore::from_config(&config.object_store));
        let notifier = build_notifier(&config.notifier).context("创建通知器失败")?;
        info!("通知方式: {}", notifier.name());

        let alerts: Arc<dyn ConsistencyAlertSink> = match &config.alerts.journal_path {
            Some(path) => Arc::new(LogAlertSink::with_journal(path)),
            None => Arc::new(LogAlertSink::new()),
        };
        let authority: Arc<dyn AuthorityCheck> =
            Arc::new(RosterAuthority::new(Arc::clone(&store.workers)));
        let validator = InputValidator::new(config.limits.clone());

        let orchestrator = ReportOrchestrator::new(
            store.clone(),
            selector,
            object_store,
            notifier,
            alerts,
            validator.clone(),
        );
        let lifecycle = ReportLifecycleController::new(
            Arc::clone(&store.reports),
            Arc::clone(&store.workers),
            authority,
            config.lifecycle.clone(),
            validator,
        );
        let queries = ReportQueries::new(store.clone());

        Ok(Self {
            config,
            database,
            store,
            orchestrator,
            lifecycle,
            queries,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn orchestrator(&self) -> &ReportOrchestrator {
        &self.orchestrator
    }

    pub fn lifecycle(&self) -> &ReportLifecycleController {
        &self.lifecycle
    }

    pub fn queries(&self) -> &ReportQueries {
        &self.queries
    }

    /// 按配置的远程调用超时创建调用上下文
    pub fn default_context(&self) -> CallContext {
        CallContext::with_timeout(self.config.calls.remote_call_timeout())
    }

    pub async fn health_check(&self) -> Result<()> {
        self.database.health_check().await
    }

    pub async fn shutdown(&self) {
        self.database.close().await;
        info!("报修系统已关闭");
    }
}

/// 文件型 SQLite 数据库的上级目录不存在时先创建
fn ensure_database_dir(url: &str) -> Result<()> {
    let Some(path) = sqlite_file_path(url) else {
        return Ok(());
    };

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("创建数据库目录失败: {}", parent.display()))?;
        }
    }
    Ok(())
}

fn sqlite_file_path(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);

    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(path)
    }
}
