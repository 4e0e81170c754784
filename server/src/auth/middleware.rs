//! 認証ミドルウェア
//!
//! `Authorization: Token <key>`（または `Bearer <key>`）からAPIトークンを取り出し、
//! SHA-256ハッシュで照合してユーザーを解決する。

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use control_interface_common::error::ControlError;
use control_interface_common::types::User;

use crate::api::error::AppError;
use crate::db;
use crate::AppState;

/// 認証済みユーザー（requestの拡張データ）
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Authorizationヘッダーからトークンを抽出
///
/// `Token` と `Bearer` のどちらのスキームも受け付ける。
pub fn extract_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        Some(token)
    } else {
        None
    }
}

/// APIトークン認証ミドルウェア
///
/// # Returns
/// * `Ok(Response)` - 認証成功、requestに `AuthUser` を追加
/// * `Err(AppError)` - 認証失敗、401 Unauthorized
pub async fn token_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ControlError::Authentication("Missing Authorization header".to_string()))?;

    let token = extract_token(auth_header).ok_or_else(|| {
        ControlError::Authentication("Invalid Authorization header format".to_string())
    })?;

    let user_id = db::api_tokens::find_user_id(&state.db_pool, token)
        .await?
        .ok_or_else(|| ControlError::Authentication("Invalid token".to_string()))?;

    let user = db::users::find_by_id(&state.db_pool, user_id)
        .await?
        .ok_or_else(|| ControlError::Authentication("Token owner no longer exists".to_string()))?;

    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}

/// 管理者限定ミドルウェア
///
/// `token_auth_middleware` の内側に配置する。
pub async fn require_admin_middleware(request: Request, next: Next) -> Result<Response, AppError> {
    let is_admin = request
        .extensions()
        .get::<AuthUser>()
        .map(|AuthUser(user)| user.is_admin)
        .ok_or_else(|| ControlError::Authentication("Not authenticated".to_string()))?;

    if !is_admin {
        return Err(ControlError::Authorization("Admin privileges required".to_string()).into());
    }

    Ok(next.run(request).await)
}
