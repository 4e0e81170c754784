//! 認証API
//!
//! ユーザー名とパスワードでAPIトークンを発行する

use axum::{extract::State, Extension, Json};
use control_interface_common::error::ControlError;
use control_interface_common::protocol::{LoginRequest, LoginResponse};
use control_interface_common::types::User;

use super::error::{ApiJson, AppError};
use crate::auth::password::verify_password;
use crate::auth::AuthUser;
use crate::db;
use crate::AppState;

/// POST /api/token-auth/ - ログイン
///
/// # Returns
/// * `200 OK` - `{"token": "<key>"}`（平文はこの時だけ返す）
/// * `400 Bad Request` - 認証情報が一致しない
pub async fn login(
    State(app_state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (user, password_hash) = db::users::find_credentials(&app_state.db_pool, &request.username)
        .await?
        .ok_or(ControlError::InvalidCredentials)?;

    if !verify_password(&request.password, &password_hash)? {
        tracing::warn!(username = %request.username, "Login failed: invalid password");
        return Err(ControlError::InvalidCredentials.into());
    }

    let token = db::api_tokens::issue(&app_state.db_pool, user.id).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse { token }))
}

/// GET /api/v1/user/ - ユーザー一覧（管理者限定、パスワードハッシュは含まない）
pub async fn list_users(State(app_state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(db::users::list(&app_state.db_pool).await?))
}

/// GET /api/v1/user/me/ - 認証中のユーザー
pub async fn me(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<User> {
    Json(user)
}
