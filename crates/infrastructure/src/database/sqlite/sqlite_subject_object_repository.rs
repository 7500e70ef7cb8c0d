use async_trait::async_trait;
use reports_core::{ReportResult, SubjectObject, SubjectObjectRepository};
use sqlx::SqlitePool;
use tracing::debug;

use crate::database::mapping::{map_db_error, MappingHelpers};

pub struct SqliteSubjectObjectRepository {
    pool: SqlitePool,
}

impl SqliteSubjectObjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_subject_object(row: &sqlx::sqlite::SqliteRow) -> ReportResult<SubjectObject> {
        Ok(SubjectObject {
            id: MappingHelpers::column(row, "id")?,
            name: MappingHelpers::column(row, "name")?,
            category: MappingHelpers::parse_enum(row, "category")?,
            place_id: MappingHelpers::column(row, "place_id")?,
            report_id: MappingHelpers::column(row, "report_id")?,
        })
    }
}

#[async_trait]
impl SubjectObjectRepository for SqliteSubjectObjectRepository {
    async fn create(&self, object: &SubjectObject) -> ReportResult<SubjectObject> {
        let result = sqlx::query(
            "INSERT INTO subject_objects (name, category, place_id, report_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(&object.name)
        .bind(object.category.as_str())
        .bind(object.place_id)
        .bind(object.report_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error("create_subject_object", e))?;

        let mut created = object.clone();
        created.id = result.last_insert_rowid();
        debug!(
            "创建报修对象成功: {} (报修单 {})",
            created.name, created.report_id
        );
        Ok(created)
    }

    async fn get_by_report_id(&self, report_id: i64) -> ReportResult<Option<SubjectObject>> {
        let row = sqlx::query(
            "SELECT id, name, category, place_id, report_id FROM subject_objects WHERE report_id = $1",
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("get_subject_object", e))?;

        row.as_ref().map(Self::row_to_subject_object).transpose()
    }

    async fn delete_by_report_id(&self, report_id: i64) -> ReportResult<bool> {
        let result = sqlx::query("DELETE FROM subject_objects WHERE report_id = $1")
            .bind(report_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("delete_subject_object", e))?;

        Ok(result.rows_affected() > 0)
    }
}
