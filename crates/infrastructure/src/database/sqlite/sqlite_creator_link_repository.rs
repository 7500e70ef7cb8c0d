use async_trait::async_trait;
use reports_core::{ReportCreatorLink, ReportCreatorLinkRepository, ReportResult};
use sqlx::SqlitePool;
use tracing::debug;

use crate::database::mapping::{map_db_error, MappingHelpers};

pub struct SqliteCreatorLinkRepository {
    pool: SqlitePool,
}

impl SqliteCreatorLinkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportCreatorLinkRepository for SqliteCreatorLinkRepository {
    async fn create(&self, link: &ReportCreatorLink) -> ReportResult<ReportCreatorLink> {
        sqlx::query("INSERT INTO report_creators (report_id, creator_id) VALUES ($1, $2)")
            .bind(link.report_id)
            .bind(&link.creator_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("create_creator_link", e))?;

        debug!("报修单 {} 关联报修人 {}", link.report_id, link.creator_id);
        Ok(link.clone())
    }

    async fn get_by_report_id(&self, report_id: i64) -> ReportResult<Option<ReportCreatorLink>> {
        let row = sqlx::query("SELECT report_id, creator_id FROM report_creators WHERE report_id = $1")
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("get_creator_link", e))?;

        match row {
            Some(row) => Ok(Some(ReportCreatorLink {
                report_id: MappingHelpers::column(&row, "report_id")?,
                creator_id: MappingHelpers::column(&row, "creator_id")?,
            })),
            None => Ok(None),
        }
    }

    async fn delete_by_report_id(&self, report_id: i64) -> ReportResult<bool> {
        let result = sqlx::query("DELETE FROM report_creators WHERE report_id = $1")
            .bind(report_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("delete_creator_link", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_report_ids_by_creator(&self, creator_id: &str) -> ReportResult<Vec<i64>> {
        sqlx::query_scalar("SELECT report_id FROM report_creators WHERE creator_id = $1 ORDER BY report_id")
            .bind(creator_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("list_creator_links", e))
    }
}
