use async_trait::async_trait;
use reports_core::{Place, PlaceRepository, ReportResult};
use sqlx::SqlitePool;
use tracing::debug;

use crate::database::mapping::{map_db_error, MappingHelpers};

/// 场所仓储，(name, floor) 上有唯一约束
pub struct SqlitePlaceRepository {
    pool: SqlitePool,
}

impl SqlitePlaceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_place(row: &sqlx::sqlite::SqliteRow) -> ReportResult<Place> {
        Ok(Place {
            id: MappingHelpers::column(row, "id")?,
            name: MappingHelpers::column(row, "name")?,
            floor: MappingHelpers::column(row, "floor")?,
        })
    }
}

#[async_trait]
impl PlaceRepository for SqlitePlaceRepository {
    async fn find_by_name_and_floor(&self, name: &str, floor: i32) -> ReportResult<Option<Place>> {
        let row = sqlx::query("SELECT id, name, floor FROM places WHERE name = $1 AND floor = $2")
            .bind(name)
            .bind(floor)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("find_place", e))?;

        row.as_ref().map(Self::row_to_place).transpose()
    }

    async fn get_by_id(&self, id: i64) -> ReportResult<Option<Place>> {
        let row = sqlx::query("SELECT id, name, floor FROM places WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("get_place", e))?;

        row.as_ref().map(Self::row_to_place).transpose()
    }

    async fn create(&self, place: &Place) -> ReportResult<Place> {
        let result = sqlx::query("INSERT INTO places (name, floor) VALUES ($1, $2)")
            .bind(&place.name)
            .bind(place.floor)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("create_place", e))?;

        let mut created = place.clone();
        created.id = result.last_insert_rowid();
        debug!("创建场所成功: {}", created.entity_description());
        Ok(created)
    }

    async fn count_by_name_and_floor(&self, name: &str, floor: i32) -> ReportResult<usize> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM places WHERE name = $1 AND floor = $2")
                .bind(name)
                .bind(floor)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_db_error("count_places", e))?;

        Ok(count as usize)
    }

    fn enforces_unique_key(&self) -> bool {
        true
    }
}
