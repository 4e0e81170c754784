//! Webhook登録の永続化

use super::{format_timestamp, parse_timestamp, parse_uuid};
use control_interface_common::error::ControlError;
use control_interface_common::types::{Hook, HookEventKind};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Webhookを登録
pub async fn create_hook(pool: &SqlitePool, hook: &Hook) -> Result<(), ControlError> {
    sqlx::query("INSERT INTO hooks (id, user_id, event, target, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(hook.id.to_string())
        .bind(hook.user.to_string())
        .bind(hook.event.as_str())
        .bind(&hook.target)
        .bind(format_timestamp(&hook.created_at))
        .execute(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to create hook: {}", e)))?;

    Ok(())
}

/// ユーザーのWebhook一覧
pub async fn list_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Hook>, ControlError> {
    let rows = sqlx::query_as::<_, HookRow>(
        "SELECT id, user_id, event, target, created_at FROM hooks WHERE user_id = ? ORDER BY created_at ASC, rowid ASC",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await
    .map_err(|e| ControlError::Database(format!("Failed to list hooks: {}", e)))?;

    collect_hooks(rows)
}

/// イベントを購読しているWebhook一覧（配信用）
pub async fn list_for_event(
    pool: &SqlitePool,
    event: HookEventKind,
) -> Result<Vec<Hook>, ControlError> {
    let rows = sqlx::query_as::<_, HookRow>(
        "SELECT id, user_id, event, target, created_at FROM hooks WHERE event = ? ORDER BY created_at ASC, rowid ASC",
    )
    .bind(event.as_str())
    .fetch_all(pool)
    .await
    .map_err(|e| ControlError::Database(format!("Failed to list hooks: {}", e)))?;

    collect_hooks(rows)
}

/// IDでWebhookを取得
pub async fn get_hook(pool: &SqlitePool, id: Uuid) -> Result<Option<Hook>, ControlError> {
    let row = sqlx::query_as::<_, HookRow>(
        "SELECT id, user_id, event, target, created_at FROM hooks WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| ControlError::Database(format!("Failed to get hook: {}", e)))?;

    Ok(row.map(HookRow::into_hook).transpose()?.flatten())
}

/// Webhookを削除
pub async fn delete_hook(pool: &SqlitePool, id: Uuid) -> Result<bool, ControlError> {
    let result = sqlx::query("DELETE FROM hooks WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to delete hook: {}", e)))?;

    Ok(result.rows_affected() > 0)
}

#[derive(sqlx::FromRow)]
struct HookRow {
    id: String,
    user_id: String,
    event: String,
    target: String,
    created_at: String,
}

impl HookRow {
    // 未知のイベント名の行は読み飛ばす。それ以外の破損はエラー
    fn into_hook(self) -> Result<Option<Hook>, ControlError> {
        let event = match self.event.parse::<HookEventKind>() {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(hook_id = %self.id, "Skipping hook: {}", e);
                return Ok(None);
            }
        };
        Ok(Some(Hook {
            id: parse_uuid(&self.id, "hooks.id")?,
            user: parse_uuid(&self.user_id, "hooks.user_id")?,
            event,
            target: self.target,
            created_at: parse_timestamp(&self.created_at, "hooks.created_at")?,
        }))
    }
}

fn collect_hooks(rows: Vec<HookRow>) -> Result<Vec<Hook>, ControlError> {
    let mut hooks = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(hook) = row.into_hook()? {
            hooks.push(hook);
        }
    }
    Ok(hooks)
}
