//! APIトークン操作
//!
//! トークンは平文を保存せず、SHA-256ハッシュで照合する。

use super::format_timestamp;
use control_interface_common::error::ControlError;
use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

/// トークンを発行して保存
///
/// # Returns
/// * `Ok(String)` - 平文トークン（この時だけ取得できる）
pub async fn issue(pool: &SqlitePool, user_id: Uuid) -> Result<String, ControlError> {
    let token = generate_token();

    sqlx::query("INSERT INTO api_tokens (key_hash, user_id, created_at) VALUES (?, ?, ?)")
        .bind(hash_with_sha256(&token))
        .bind(user_id.to_string())
        .bind(format_timestamp(&Utc::now()))
        .execute(pool)
        .await
        .map_err(|e| ControlError::Database(format!("Failed to create API token: {}", e)))?;

    Ok(token)
}

/// 平文トークンからユーザーIDを解決
///
/// # Returns
/// * `Ok(Some(Uuid))` - 有効なトークン
/// * `Ok(None)` - 未知のトークン
pub async fn find_user_id(pool: &SqlitePool, token: &str) -> Result<Option<Uuid>, ControlError> {
    let user_id: Option<String> =
        sqlx::query_scalar("SELECT user_id FROM api_tokens WHERE key_hash = ?")
            .bind(hash_with_sha256(token))
            .fetch_optional(pool)
            .await
            .map_err(|e| ControlError::Database(format!("Failed to find API token: {}", e)))?;

    match user_id {
        Some(raw) => Uuid::parse_str(&raw)
            .map(Some)
            .map_err(|e| ControlError::Database(format!("Invalid user id: {}", e))),
        None => Ok(None),
    }
}

/// トークンを生成（40文字のランダム英数字）
fn generate_token() -> String {
    let charset: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();

    (0..40)
        .map(|_| {
            let idx = rng.gen_range(0..charset.len());
            charset[idx] as char
        })
        .collect()
}

/// SHA-256ハッシュ化（16進数64文字）
fn hash_with_sha256(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
