//! ユーザーCRUD操作

use super::{format_timestamp, parse_timestamp, parse_uuid};
use control_interface_common::error::ControlError;
use control_interface_common::types::User;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// ユーザーを作成
///
/// # Arguments
/// * `pool` - データベース接続プール
/// * `username` - ユーザー名
/// * `email` - メールアドレス
/// * `password_hash` - bcryptハッシュ化されたパスワード
/// * `is_admin` - 管理者フラグ
///
/// # Returns
/// * `Ok(User)` - 作成されたユーザー
/// * `Err(ControlError)` - 作成失敗（ユーザー名重複など）
pub async fn create(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
    is_admin: bool,
) -> Result<User, ControlError> {
    let id = Uuid::new_v4();
    let created_at = Utc::now();

    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, is_admin, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(is_admin as i32)
    .bind(format_timestamp(&created_at))
    .execute(pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            ControlError::Conflict(format!("Username '{}' already exists", username))
        } else {
            ControlError::Database(format!("Failed to create user: {}", e))
        }
    })?;

    Ok(User {
        id,
        username: username.to_string(),
        email: email.to_string(),
        is_admin,
        created_at,
    })
}

/// ユーザー名でユーザーとパスワードハッシュを検索（ログイン用）
pub async fn find_credentials(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<(User, String)>, ControlError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, is_admin, created_at FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(|e| ControlError::Database(format!("Failed to find user: {}", e)))?;

    row.map(|r| {
        let hash = r.password_hash.clone();
        r.into_user().map(|user| (user, hash))
    })
    .transpose()
}

/// IDでユーザーを検索
pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>, ControlError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, is_admin, created_at FROM users WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| ControlError::Database(format!("Failed to find user: {}", e)))?;

    row.map(UserRow::into_user).transpose()
}

/// すべてのユーザーを取得
pub async fn list(pool: &SqlitePool) -> Result<Vec<User>, ControlError> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, is_admin, created_at FROM users ORDER BY created_at ASC, rowid ASC",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| ControlError::Database(format!("Failed to list users: {}", e)))?;

    rows.into_iter().map(UserRow::into_user).collect()
}

/// 管理者が1人でも存在するか
pub async fn has_admin(pool: &SqlitePool) -> Result<bool, ControlError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_admin = 1")
        .fetch_one(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to count admins: {}", e)))?;
    Ok(count > 0)
}

// SQLiteからの行取得用の内部型
#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    is_admin: i32,
    created_at: String,
}

impl UserRow {
    fn into_user(self) -> Result<User, ControlError> {
        Ok(User {
            id: parse_uuid(&self.id, "users.id")?,
            username: self.username,
            email: self.email,
            is_admin: self.is_admin != 0,
            created_at: parse_timestamp(&self.created_at, "users.created_at")?,
        })
    }
}
