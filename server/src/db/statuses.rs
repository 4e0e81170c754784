//! ステータス（ポーリング結果）の永続化
//!
//! Statusは追記専用。サービスの `up` 更新とStatus追加は同一トランザクションで行う。

use super::{format_timestamp, parse_optional_uuid, parse_timestamp, parse_uuid};
use control_interface_common::error::ControlError;
use control_interface_common::protocol::StatusFilter;
use control_interface_common::types::Status;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "SELECT id, service_id, up, result, created_by, updated_by, created_at FROM statuses";

/// ポーリング結果を記録
///
/// サービスの `up`/`updated_at` 更新とStatusの追加を1トランザクションで行う。
/// サービスが既に削除されていた場合は何も書き込まずに `ServiceNotFound` を返す。
pub async fn record_poll_outcome(pool: &SqlitePool, status: &Status) -> Result<(), ControlError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ControlError::Database(format!("Failed to begin transaction: {}", e)))?;

    let updated = sqlx::query("UPDATE services SET up = ?, updated_at = ? WHERE id = ?")
        .bind(status.up as i32)
        .bind(format_timestamp(&status.created_at))
        .bind(status.service.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to update service state: {}", e)))?;

    if updated.rows_affected() == 0 {
        tx.rollback()
            .await
            .map_err(|e| ControlError::Database(format!("Failed to rollback: {}", e)))?;
        return Err(ControlError::ServiceNotFound(status.service));
    }

    let result = serde_json::to_string(&status.result)
        .map_err(|e| ControlError::Internal(format!("Failed to serialize result: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO statuses (id, service_id, up, result, created_by, updated_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(status.id.to_string())
    .bind(status.service.to_string())
    .bind(status.up as i32)
    .bind(result)
    .bind(status.created_by.map(|id| id.to_string()))
    .bind(status.updated_by.map(|id| id.to_string()))
    .bind(format_timestamp(&status.created_at))
    .execute(&mut *tx)
    .await
    .map_err(|e| ControlError::Database(format!("Failed to insert status: {}", e)))?;

    tx.commit()
        .await
        .map_err(|e| ControlError::Database(format!("Failed to commit transaction: {}", e)))?;

    Ok(())
}

/// IDでStatusを取得
pub async fn get_status(pool: &SqlitePool, id: Uuid) -> Result<Option<Status>, ControlError> {
    let row = sqlx::query_as::<_, StatusRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to get status: {}", e)))?;

    row.map(Status::try_from).transpose()
}

/// フィルタ付きでStatusを取得（ページング）
///
/// # Returns
/// * `Ok((Vec<Status>, u64))` - ページ内の要素とフィルタ後の総件数
pub async fn filter_and_paginate(
    pool: &SqlitePool,
    filter: &StatusFilter,
    page: u32,
    per_page: u32,
) -> Result<(Vec<Status>, u64), ControlError> {
    let mut conditions = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(service) = filter.service {
        conditions.push("service_id = ?");
        params.push(service.to_string());
    }

    if let Some(up) = filter.up {
        conditions.push(if up { "up = 1" } else { "up = 0" });
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM statuses {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for param in &params {
        count_query = count_query.bind(param);
    }
    let total = count_query
        .fetch_one(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to count statuses: {}", e)))?;

    let direction = if filter.descending { "DESC" } else { "ASC" };
    let data_sql = format!(
        "{} {} ORDER BY created_at {dir}, rowid {dir} LIMIT ? OFFSET ?",
        SELECT_COLUMNS,
        where_clause,
        dir = direction
    );
    let offset = (page.saturating_sub(1) as i64) * per_page as i64;

    let mut data_query = sqlx::query_as::<_, StatusRow>(&data_sql);
    for param in &params {
        data_query = data_query.bind(param);
    }
    let rows = data_query
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to list statuses: {}", e)))?;

    let statuses = rows
        .into_iter()
        .map(Status::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((statuses, total as u64))
}

#[derive(sqlx::FromRow)]
struct StatusRow {
    id: String,
    service_id: String,
    up: i32,
    result: String,
    created_by: Option<String>,
    updated_by: Option<String>,
    created_at: String,
}

impl TryFrom<StatusRow> for Status {
    type Error = ControlError;

    fn try_from(row: StatusRow) -> Result<Self, Self::Error> {
        let result = serde_json::from_str::<Map<String, Value>>(&row.result).map_err(|e| {
            ControlError::Database(format!("Invalid result in status {}: {}", row.id, e))
        })?;
        Ok(Status {
            id: parse_uuid(&row.id, "statuses.id")?,
            service: parse_uuid(&row.service_id, "statuses.service_id")?,
            up: row.up != 0,
            result,
            created_by: parse_optional_uuid(row.created_by, "statuses.created_by")?,
            updated_by: parse_optional_uuid(row.updated_by, "statuses.updated_by")?,
            created_at: parse_timestamp(&row.created_at, "statuses.created_at")?,
        })
    }
}
