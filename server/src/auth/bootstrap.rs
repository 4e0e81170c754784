//! 管理者アカウントの作成
//!
//! 起動時の環境変数、または `create-admin` サブコマンドから作成する

use control_interface_common::error::{CommonError, ControlError};
use control_interface_common::types::User;
use sqlx::SqlitePool;

use crate::auth::password::hash_password;
use crate::db;

/// 管理者ユーザー名の環境変数
pub const ADMIN_USERNAME_ENV: &str = "CONTROL_ADMIN_USERNAME";

/// 管理者パスワードの環境変数
pub const ADMIN_PASSWORD_ENV: &str = "CONTROL_ADMIN_PASSWORD";

/// 管理者を作成
///
/// # Returns
/// * `Ok(User)` - 作成された管理者
/// * `Err(ControlError::Conflict)` - ユーザー名が既に存在する
pub async fn create_admin(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User, ControlError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(CommonError::Validation("Username and password are required".to_string()).into());
    }

    let password_hash = hash_password(password)?;
    let user = db::users::create(pool, username.trim(), email, &password_hash, true).await?;
    tracing::info!(user_id = %user.id, "Created admin user: username={}", user.username);
    Ok(user)
}

/// 環境変数から管理者を作成
///
/// # Environment Variables
/// * `CONTROL_ADMIN_USERNAME` - 管理者ユーザー名（省略時: "admin"）
/// * `CONTROL_ADMIN_PASSWORD` - 管理者パスワード（未設定なら何もしない）
///
/// # Returns
/// * `Ok(Some(username))` - 作成した、または既に存在した
/// * `Ok(None)` - パスワード未設定のためスキップ
pub async fn create_admin_from_env(pool: &SqlitePool) -> Result<Option<String>, ControlError> {
    let password = match std::env::var(ADMIN_PASSWORD_ENV) {
        Ok(p) if !p.is_empty() => p,
        _ => {
            tracing::debug!("{} not set, skipping admin creation", ADMIN_PASSWORD_ENV);
            return Ok(None);
        }
    };

    let username = std::env::var(ADMIN_USERNAME_ENV)
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| "admin".to_string());

    match create_admin(pool, &username, "", &password).await {
        Ok(user) => Ok(Some(user.username)),
        Err(ControlError::Conflict(_)) => {
            tracing::warn!("Admin user {} already exists, skipping creation", username);
            Ok(Some(username))
        }
        Err(e) => {
            tracing::error!("Failed to create admin user from env: {}", e);
            Err(e)
        }
    }
}
