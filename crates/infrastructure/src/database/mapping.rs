//! Shared database mapping utilities
//!
//! sqlx errors become `ReportError` here so repositories never leak driver types.

use std::str::FromStr;

use reports_core::{ReportError, ReportResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Decode, Row, Sqlite, Type};

/// 唯一约束冲突映射为 `Conflict`，其余都视为存储不可用
pub fn map_db_error(operation: &str, err: sqlx::Error) -> ReportError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ReportError::Conflict(format!("{operation}: {db_err}"))
        }
        _ => ReportError::dependency(operation, err.to_string()),
    }
}

/// Helper functions for reading typed columns from SQLite rows
pub struct MappingHelpers;

impl MappingHelpers {
    pub fn column<'r, T>(row: &'r SqliteRow, field_name: &str) -> ReportResult<T>
    where
        T: Decode<'r, Sqlite> + Type<Sqlite>,
    {
        row.try_get(field_name)
            .map_err(|e| ReportError::Serialization(format!("读取字段 {field_name} 失败: {e}")))
    }

    /// 以文本保存的枚举列，如状态、优先级、部门和类别
    pub fn parse_enum<T>(row: &SqliteRow, field_name: &str) -> ReportResult<T>
    where
        T: FromStr<Err = ReportError>,
    {
        let raw: String = Self::column(row, field_name)?;
        raw.parse().map_err(|e: ReportError| {
            ReportError::Serialization(format!("字段 {field_name} 的值 {raw} 无效: {e}"))
        })
    }
}
