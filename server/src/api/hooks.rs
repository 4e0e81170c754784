//! Webhook管理API
//!
//! Webhookは作成したユーザーに属し、他のユーザーからは見えない。

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use control_interface_common::error::ControlError;
use control_interface_common::protocol::{validate_http_url, CreateHookRequest};
use control_interface_common::types::{Hook, HookEventKind};
use uuid::Uuid;

use super::error::{ApiJson, AppError};
use crate::auth::AuthUser;
use crate::db::hooks as db;
use crate::AppState;

/// GET /api/v1/webhook/ - 自分のWebhook一覧
pub async fn list_hooks(
    State(app_state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<Hook>>, AppError> {
    Ok(Json(db::list_for_user(&app_state.db_pool, user.id).await?))
}

/// POST /api/v1/webhook/ - Webhook登録
///
/// # Returns
/// * `201 Created` - 登録されたWebhook
/// * `400 Bad Request` - 未知のイベント名、またはtargetがhttp(s)でない
pub async fn create_hook(
    State(app_state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiJson(request): ApiJson<CreateHookRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = request.event.trim().parse::<HookEventKind>()?;
    let target = request.target.trim();
    validate_http_url(target, "Target")?;

    let hook = Hook {
        id: Uuid::new_v4(),
        user: user.id,
        event,
        target: target.to_string(),
        created_at: Utc::now(),
    };
    db::create_hook(&app_state.db_pool, &hook).await?;

    tracing::info!(hook_id = %hook.id, event = %hook.event, "Webhook registered");
    Ok((StatusCode::CREATED, Json(hook)))
}

/// GET /api/v1/webhook/:id/ - Webhook詳細
pub async fn get_hook(
    State(app_state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Hook>, AppError> {
    Ok(Json(find_own_hook(&app_state, user.id, id).await?))
}

/// DELETE /api/v1/webhook/:id/ - Webhook削除
pub async fn delete_hook(
    State(app_state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let hook = find_own_hook(&app_state, user.id, id).await?;
    db::delete_hook(&app_state.db_pool, hook.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// 他人のWebhookは存在しないものとして扱う
async fn find_own_hook(app_state: &AppState, user_id: Uuid, id: Uuid) -> Result<Hook, ControlError> {
    db::get_hook(&app_state.db_pool, id)
        .await?
        .filter(|hook| hook.user == user_id)
        .ok_or_else(|| ControlError::NotFound(format!("Hook {}", id)))
}
