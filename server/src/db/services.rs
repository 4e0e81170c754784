//! サービスCRUD操作

use super::{format_timestamp, parse_optional_uuid, parse_timestamp, parse_uuid};
use control_interface_common::error::ControlError;
use control_interface_common::types::Service;
use sqlx::SqlitePool;
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "SELECT id, name, url, token, up, created_by, updated_by, created_at, updated_at FROM services";

/// サービスを登録
pub async fn create_service(pool: &SqlitePool, service: &Service) -> Result<(), ControlError> {
    sqlx::query(
        r#"
        INSERT INTO services (id, name, url, token, up, created_by, updated_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(service.id.to_string())
    .bind(&service.name)
    .bind(&service.url)
    .bind(&service.token)
    .bind(service.up as i32)
    .bind(service.created_by.map(|id| id.to_string()))
    .bind(service.updated_by.map(|id| id.to_string()))
    .bind(format_timestamp(&service.created_at))
    .bind(format_timestamp(&service.updated_at))
    .execute(pool)
    .await
    .map_err(|e| ControlError::Database(format!("Failed to create service: {}", e)))?;

    Ok(())
}

/// サービス一覧を取得（登録順）
pub async fn list_services(pool: &SqlitePool) -> Result<Vec<Service>, ControlError> {
    let rows = sqlx::query_as::<_, ServiceRow>(&format!(
        "{} ORDER BY created_at ASC, rowid ASC",
        SELECT_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(|e| ControlError::Database(format!("Failed to list services: {}", e)))?;

    rows.into_iter().map(Service::try_from).collect()
}

/// サービスをページ単位で取得
///
/// # Returns
/// * `Ok((Vec<Service>, u64))` - ページ内の要素と総件数
pub async fn list_services_page(
    pool: &SqlitePool,
    page: u32,
    per_page: u32,
) -> Result<(Vec<Service>, u64), ControlError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services")
        .fetch_one(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to count services: {}", e)))?;

    let offset = (page.saturating_sub(1) as i64) * per_page as i64;
    let rows = sqlx::query_as::<_, ServiceRow>(&format!(
        "{} ORDER BY created_at ASC, rowid ASC LIMIT ? OFFSET ?",
        SELECT_COLUMNS
    ))
    .bind(per_page as i64)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| ControlError::Database(format!("Failed to list services: {}", e)))?;

    let services = rows
        .into_iter()
        .map(Service::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((services, total as u64))
}

/// IDでサービスを取得
pub async fn get_service(pool: &SqlitePool, id: Uuid) -> Result<Option<Service>, ControlError> {
    let row = sqlx::query_as::<_, ServiceRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to get service: {}", e)))?;

    row.map(Service::try_from).transpose()
}

/// サービスの編集可能フィールドを更新
///
/// `up` はポーリングのみが書き換えるため、ここでは更新しない。
///
/// # Returns
/// * `Ok(true)` - 更新した
/// * `Ok(false)` - 該当サービスなし
pub async fn update_service(pool: &SqlitePool, service: &Service) -> Result<bool, ControlError> {
    let result = sqlx::query(
        r#"
        UPDATE services SET
            name = ?, url = ?, token = ?, updated_by = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&service.name)
    .bind(&service.url)
    .bind(&service.token)
    .bind(service.updated_by.map(|id| id.to_string()))
    .bind(format_timestamp(&service.updated_at))
    .bind(service.id.to_string())
    .execute(pool)
    .await
    .map_err(|e| ControlError::Database(format!("Failed to update service: {}", e)))?;

    Ok(result.rows_affected() > 0)
}

/// サービスを削除（Status/UserServiceTokenはカスケード削除）
pub async fn delete_service(pool: &SqlitePool, id: Uuid) -> Result<bool, ControlError> {
    let result = sqlx::query("DELETE FROM services WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to delete service: {}", e)))?;

    Ok(result.rows_affected() > 0)
}

/// サービス件数
pub async fn count_services(pool: &SqlitePool) -> Result<u64, ControlError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services")
        .fetch_one(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to count services: {}", e)))?;
    Ok(count as u64)
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: String,
    name: String,
    url: String,
    token: String,
    up: i32,
    created_by: Option<String>,
    updated_by: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ServiceRow> for Service {
    type Error = ControlError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        Ok(Service {
            id: parse_uuid(&row.id, "services.id")?,
            name: row.name,
            url: row.url,
            token: row.token,
            up: row.up != 0,
            created_by: parse_optional_uuid(row.created_by, "services.created_by")?,
            updated_by: parse_optional_uuid(row.updated_by, "services.updated_by")?,
            created_at: parse_timestamp(&row.created_at, "services.created_at")?,
            updated_at: parse_timestamp(&row.updated_at, "services.updated_at")?,
        })
    }
}
