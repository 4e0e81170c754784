//! ユーザー毎のサービストークンの永続化

use super::{format_timestamp, parse_timestamp, parse_uuid};
use control_interface_common::error::ControlError;
use control_interface_common::protocol::UserServiceTokenFilter;
use control_interface_common::types::UserServiceToken;
use sqlx::SqlitePool;
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "SELECT id, service_id, user_id, email, token, created_at FROM user_service_tokens";

/// トークンを保存
///
/// サービスが既に削除されていた場合は外部キー制約で失敗する。
pub async fn create_token(pool: &SqlitePool, token: &UserServiceToken) -> Result<(), ControlError> {
    sqlx::query(
        r#"
        INSERT INTO user_service_tokens (id, service_id, user_id, email, token, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(token.id.to_string())
    .bind(token.service.to_string())
    .bind(token.user_id as i64)
    .bind(&token.email)
    .bind(&token.token)
    .bind(format_timestamp(&token.created_at))
    .execute(pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("FOREIGN KEY constraint failed") {
            ControlError::ServiceNotFound(token.service)
        } else {
            ControlError::Database(format!("Failed to create user service token: {}", e))
        }
    })?;

    Ok(())
}

/// IDでトークンを取得
pub async fn get_token(
    pool: &SqlitePool,
    id: Uuid,
) -> Result<Option<UserServiceToken>, ControlError> {
    let row = sqlx::query_as::<_, UserServiceTokenRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to get user service token: {}", e)))?;

    row.map(UserServiceToken::try_from).transpose()
}

/// フィルタ付きでトークンを取得（ページング、作成順）
pub async fn filter_and_paginate(
    pool: &SqlitePool,
    filter: &UserServiceTokenFilter,
    page: u32,
    per_page: u32,
) -> Result<(Vec<UserServiceToken>, u64), ControlError> {
    let mut conditions = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(service) = filter.service {
        conditions.push("service_id = ?");
        params.push(service.to_string());
    }

    if let Some(user_id) = filter.user_id {
        conditions.push("user_id = CAST(? AS INTEGER)");
        params.push(user_id.to_string());
    }

    if let Some(ref email) = filter.email {
        conditions.push("email = ?");
        params.push(email.clone());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM user_service_tokens {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for param in &params {
        count_query = count_query.bind(param);
    }
    let total = count_query
        .fetch_one(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to count user service tokens: {}", e)))?;

    let data_sql = format!(
        "{} {} ORDER BY created_at ASC, rowid ASC LIMIT ? OFFSET ?",
        SELECT_COLUMNS, where_clause
    );
    let offset = (page.saturating_sub(1) as i64) * per_page as i64;

    let mut data_query = sqlx::query_as::<_, UserServiceTokenRow>(&data_sql);
    for param in &params {
        data_query = data_query.bind(param);
    }
    let rows = data_query
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to list user service tokens: {}", e)))?;

    let tokens = rows
        .into_iter()
        .map(UserServiceToken::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((tokens, total as u64))
}

#[derive(sqlx::FromRow)]
struct UserServiceTokenRow {
    id: String,
    service_id: String,
    user_id: i64,
    email: String,
    token: String,
    created_at: String,
}

impl TryFrom<UserServiceTokenRow> for UserServiceToken {
    type Error = ControlError;

    fn try_from(row: UserServiceTokenRow) -> Result<Self, Self::Error> {
        let user_id = u64::try_from(row.user_id).map_err(|_| {
            ControlError::Database(format!(
                "Negative user_id {} in user service token {}",
                row.user_id, row.id
            ))
        })?;
        Ok(UserServiceToken {
            id: parse_uuid(&row.id, "user_service_tokens.id")?,
            service: parse_uuid(&row.service_id, "user_service_tokens.service_id")?,
            user_id,
            email: row.email,
            token: row.token,
            created_at: parse_timestamp(&row.created_at, "user_service_tokens.created_at")?,
        })
    }
}
