use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reports_core::config::DatabaseConfig;
use reports_core::RecordStore;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use super::sqlite::{
    SqliteCreatorLinkRepository, SqlitePlaceRepository, SqliteReportRepository,
    SqliteSubjectObjectRepository, SqliteWorkerRepository,
};

pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("创建SQLite数据库连接池");

        // 启用外键约束和WAL模式
        let connect_options = SqliteConnectOptions::from_str(&config.url)
            .context("解析数据库URL失败")?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect_with(connect_options)
            .await
            .context("创建数据库连接池失败")?;

        Ok(Self { pool })
    }

    /// 内存数据库，只保留一个永不回收的连接，否则每个连接各自是一个空库
    pub async fn in_memory() -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("解析数据库URL失败")?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await
            .context("创建内存数据库失败")?;

        let manager = Self { pool };
        manager.migrate().await?;
        Ok(manager)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 建表，可重复执行
    pub async fn migrate(&self) -> Result<()> {
        let pool = &self.pool;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS places (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                floor INTEGER NOT NULL CHECK (floor >= 1),
                UNIQUE (name, floor)
            )
            "#,
        )
        .execute(pool)
        .await
        .context("创建场所表失败")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'PENDING',
                priority TEXT NOT NULL DEFAULT 'UNASSIGNED',
                comment TEXT NOT NULL DEFAULT '',
                assigned_worker_id TEXT,
                creator_id TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .context("创建报修单表失败")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS report_attachments (
                report_id INTEGER NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                reference TEXT NOT NULL,
                PRIMARY KEY (report_id, position)
            )
            "#,
        )
        .execute(pool)
        .await
        .context("创建报修附件表失败")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subject_objects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                place_id INTEGER NOT NULL REFERENCES places(id),
                report_id INTEGER NOT NULL UNIQUE REFERENCES reports(id)
            )
            "#,
        )
        .execute(pool)
        .await
        .context("创建报修对象表失败")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS report_creators (
                report_id INTEGER PRIMARY KEY REFERENCES reports(id),
                creator_id TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .context("创建报修人关联表失败")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workers (
                id TEXT PRIMARY KEY,
                department TEXT NOT NULL,
                rank TEXT NOT NULL,
                contact TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .context("创建维修人员表失败")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_assigned_worker ON reports(assigned_worker_id)")
            .execute(pool)
            .await
            .context("创建报修单维修人员索引失败")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_report_creators_creator ON report_creators(creator_id)")
            .execute(pool)
            .await
            .context("创建报修人索引失败")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_workers_department ON workers(department)")
            .execute(pool)
            .await
            .context("创建维修人员部门索引失败")?;

        info!("数据库迁移完成");
        Ok(())
    }

    /// 基于此连接池的五个仓储
    pub fn record_store(&self) -> RecordStore {
        RecordStore::new(
            Arc::new(SqlitePlaceRepository::new(self.pool.clone())),
            Arc::new(SqliteReportRepository::new(self.pool.clone())),
            Arc::new(SqliteSubjectObjectRepository::new(self.pool.clone())),
            Arc::new(SqliteCreatorLinkRepository::new(self.pool.clone())),
            Arc::new(SqliteWorkerRepository::new(self.pool.clone())),
        )
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("数据库健康检查失败")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
