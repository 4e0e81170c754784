//! ユーザーサービストークンAPI
//!
//! 一覧・詳細の参照と、全サービスへの発行トリガー（管理者限定）

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use control_interface_common::error::{CommonError, ControlError};
use control_interface_common::protocol::{
    Page, UserServiceTokenFilter, UserTokenRequest, UserTokenTriggerResponse,
};
use control_interface_common::types::UserServiceToken;
use uuid::Uuid;

use super::error::{ApiJson, AppError};
use super::pagination::{build_page, page_number, uuid_param, QueryParams};
use crate::db::user_service_tokens as db;
use crate::tasks::enqueue_user_tokens;
use crate::AppState;

/// クエリからフィルタを組み立てる（`service`, `user_id`, `email`）
pub fn token_filter(params: &QueryParams) -> Result<UserServiceTokenFilter, ControlError> {
    let user_id = params
        .get("user_id")
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|_| {
                ControlError::from(CommonError::Validation(format!(
                    "Invalid user_id: {}",
                    raw
                )))
            })
        })
        .transpose()?;

    Ok(UserServiceTokenFilter {
        service: uuid_param(params, "service")?,
        user_id,
        email: params.get("email").map(|e| e.trim().to_string()),
    })
}

/// GET /api/v1/userservicetoken/ - トークン一覧
pub async fn list_tokens(
    State(app_state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Page<UserServiceToken>>, AppError> {
    let filter = token_filter(&params)?;
    let page = page_number(&params)?;
    let page_size = app_state.config.page_size;

    let (tokens, count) =
        db::filter_and_paginate(&app_state.db_pool, &filter, page, page_size).await?;
    Ok(Json(build_page(tokens, count, page, page_size)?))
}

/// GET /api/v1/userservicetoken/:id/ - トークン詳細
pub async fn get_token(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserServiceToken>, AppError> {
    let token = db::get_token(&app_state.db_pool, id)
        .await?
        .ok_or_else(|| ControlError::NotFound(format!("User service token {}", id)))?;
    Ok(Json(token))
}

/// POST /api/v1/userservicetoken/trigger/ - 全サービスにトークン発行を投入
///
/// 管理者限定。タスクの完了は待たずに投入件数を返す。
///
/// # Returns
/// * `201 Created` - `{"user_service_token_initiated": true, "count": N}`
/// * `400 Bad Request` - 入力不正（何も投入しない）
/// * `503 Service Unavailable` - キューに全サービス分の空きがない
pub async fn trigger_user_tokens(
    State(app_state): State<AppState>,
    ApiJson(request): ApiJson<UserTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handles = enqueue_user_tokens(&app_state.registry, &app_state.task_queue, &request).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserTokenTriggerResponse {
            user_service_token_initiated: true,
            count: handles.len(),
        }),
    ))
}
