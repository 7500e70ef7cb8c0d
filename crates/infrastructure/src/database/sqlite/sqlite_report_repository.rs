use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reports_core::{Report, ReportError, ReportRepository, ReportResult, ReportStatus};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::database::mapping::{map_db_error, MappingHelpers};

const REPORT_COLUMNS: &str =
    "id, created_at, description, status, priority, comment, assigned_worker_id, creator_id";

/// 报修单仓储，附件引用按追加顺序保存在 report_attachments 表
pub struct SqliteReportRepository {
    pool: SqlitePool,
}

impl SqliteReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_report(row: &sqlx::sqlite::SqliteRow) -> ReportResult<Report> {
        let created_at: DateTime<Utc> = MappingHelpers::column(row, "created_at")?;

        Ok(Report {
            id: MappingHelpers::column(row, "id")?,
            created_at,
            description: MappingHelpers::column(row, "description")?,
            status: MappingHelpers::parse_enum(row, "status")?,
            priority: MappingHelpers::parse_enum(row, "priority")?,
            comment: MappingHelpers::column(row, "comment")?,
            attachment_refs: Vec::new(),
            assigned_worker_id: MappingHelpers::column(row, "assigned_worker_id")?,
            creator_id: MappingHelpers::column(row, "creator_id")?,
        })
    }

    async fn load_attachments(&self, report_id: i64) -> ReportResult<Vec<String>> {
        sqlx::query_scalar(
            "SELECT reference FROM report_attachments WHERE report_id = $1 ORDER BY position",
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("list_attachments", e))
    }

    async fn hydrate(&self, rows: Vec<sqlx::sqlite::SqliteRow>) -> ReportResult<Vec<Report>> {
        let mut reports = Vec::with_capacity(rows.len());
        for row in rows {
            let mut report = Self::row_to_report(&row)?;
            report.attachment_refs = self.load_attachments(report.id).await?;
            reports.push(report);
        }
        Ok(reports)
    }

    async fn exists(&self, id: i64) -> ReportResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("get_report", e))?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl ReportRepository for SqliteReportRepository {
    async fn create(&self, report: &Report) -> ReportResult<Report> {
        let result = sqlx::query(
            r#"
            INSERT INTO reports (created_at, description, status, priority, comment, assigned_worker_id, creator_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(report.created_at)
        .bind(&report.description)
        .bind(report.status.as_str())
        .bind(report.priority.as_str())
        .bind(&report.comment)
        .bind(&report.assigned_worker_id)
        .bind(&report.creator_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("create_report", e))?;

        let mut created = report.clone();
        created.id = result.last_insert_rowid();
        created.attachment_refs = Vec::new();
        debug!("创建报修单成功: {}", created.entity_description());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> ReportResult<Option<Report>> {
        let row = sqlx::query(&format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("get_report", e))?;

        match row {
            Some(row) => {
                let mut report = Self::row_to_report(&row)?;
                report.attachment_refs = self.load_attachments(id).await?;
                Ok(Some(report))
            }
            None => Ok(None),
        }
    }

    async fn compare_and_update(&self, report: &Report, expected: &Report) -> ReportResult<bool> {
        // assigned_worker_id 可为 NULL，用 IS 比较
        let result = sqlx::query(
            r#"
            UPDATE reports
            SET status = $1, priority = $2, comment = $3, assigned_worker_id = $4
            WHERE id = $5
              AND status = $6
              AND priority = $7
              AND comment = $8
              AND assigned_worker_id IS $9
            "#,
        )
        .bind(report.status.as_str())
        .bind(report.priority.as_str())
        .bind(&report.comment)
        .bind(&report.assigned_worker_id)
        .bind(report.id)
        .bind(expected.status.as_str())
        .bind(expected.priority.as_str())
        .bind(&expected.comment)
        .bind(&expected.assigned_worker_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("update_report", e))?;

        if result.rows_affected() == 0 {
            if !self.exists(report.id).await? {
                return Err(ReportError::report_not_found(report.id));
            }
            return Ok(false);
        }

        debug!("更新报修单成功: {}", report.entity_description());
        Ok(true)
    }

    async fn delete(&self, id: i64) -> ReportResult<bool> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("delete_report", e))?;

        debug!("删除报修单 {}: 影响行数 {}", id, result.rows_affected());
        Ok(result.rows_affected() > 0)
    }

    async fn append_attachments(
        &self,
        id: i64,
        refs: &[String],
        max_total: usize,
    ) -> ReportResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("append_attachments", e))?;

        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_db_error("append_attachments", e))?;
        if found.is_none() {
            return Err(ReportError::report_not_found(id));
        }

        for reference in refs {
            sqlx::query(
                r#"
                INSERT INTO report_attachments (report_id, position, reference)
                VALUES ($1, (SELECT COALESCE(MAX(position), -1) + 1 FROM report_attachments WHERE report_id = $1), $2)
                "#,
            )
            .bind(id)
            .bind(reference)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_error("append_attachments", e))?;
        }

        // 先写后数：写入已持有写锁，并发追加在这里串行，超限时随事务回滚
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM report_attachments WHERE report_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_db_error("append_attachments", e))?;
        if total as usize > max_total {
            return Err(ReportError::validation_error(format!(
                "附件数量 {total} 超过上限 {max_total}"
            )));
        }

        tx.commit()
            .await
            .map_err(|e| map_db_error("append_attachments", e))?;

        debug!("报修单 {} 追加 {} 个附件引用", id, refs.len());
        Ok(())
    }

    async fn list_by_ids(&self, ids: &[i64]) -> ReportResult<Vec<Report>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id IN ("));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY id");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("list_reports", e))?;

        self.hydrate(rows).await
    }

    async fn list_by_assigned_worker(&self, worker_id: &str) -> ReportResult<Vec<Report>> {
        let rows = sqlx::query(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE assigned_worker_id = $1 ORDER BY id"
        ))
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("list_reports_by_worker", e))?;

        self.hydrate(rows).await
    }

    async fn count_open_by_worker(&self, worker_id: &str) -> ReportResult<usize> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reports WHERE assigned_worker_id = $1 AND status != $2",
        )
        .bind(worker_id)
        .bind(ReportStatus::Resolved.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("count_open_reports", e))?;

        Ok(count as usize)
    }
}
