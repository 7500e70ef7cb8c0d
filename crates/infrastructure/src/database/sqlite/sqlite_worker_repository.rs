use async_trait::async_trait;
use reports_core::{Department, ReportResult, Worker, WorkerRepository};
use sqlx::SqlitePool;
use tracing::debug;

use crate::database::mapping::{map_db_error, MappingHelpers};

/// 维修人员名册的本地副本
pub struct SqliteWorkerRepository {
    pool: SqlitePool,
}

impl SqliteWorkerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_worker(row: &sqlx::sqlite::SqliteRow) -> ReportResult<Worker> {
        Ok(Worker {
            id: MappingHelpers::column(row, "id")?,
            department: MappingHelpers::parse_enum(row, "department")?,
            rank: MappingHelpers::column(row, "rank")?,
            contact: MappingHelpers::column(row, "contact")?,
        })
    }
}

#[async_trait]
impl WorkerRepository for SqliteWorkerRepository {
    async fn list_by_department(&self, department: Department) -> ReportResult<Vec<Worker>> {
        let rows = sqlx::query(
            "SELECT id, department, rank, contact FROM workers WHERE department = $1 ORDER BY id",
        )
        .bind(department.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("list_workers", e))?;

        rows.iter().map(Self::row_to_worker).collect()
    }

    async fn get_by_id(&self, id: &str) -> ReportResult<Option<Worker>> {
        let row = sqlx::query("SELECT id, department, rank, contact FROM workers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("get_worker", e))?;

        row.as_ref().map(Self::row_to_worker).transpose()
    }

    async fn register(&self, worker: &Worker) -> ReportResult<()> {
        sqlx::query(
            r#"
            INSERT INTO workers (id, department, rank, contact)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(id) DO UPDATE SET
                department = excluded.department,
                rank = excluded.rank,
                contact = excluded.contact
            "#,
        )
        .bind(&worker.id)
        .bind(worker.department.as_str())
        .bind(&worker.rank)
        .bind(&worker.contact)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("register_worker", e))?;

        debug!("登记维修人员成功: {} ({})", worker.id, worker.department);
        Ok(())
    }
}
