//! ステータス参照API
//!
//! Statusはポーリングのみが作成する。このAPIは読み取り専用。

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    Json,
};
use control_interface_common::error::{CommonError, ControlError};
use control_interface_common::protocol::{Page, StatusFilter};
use control_interface_common::types::Status;
use serde_json::json;
use uuid::Uuid;

use super::error::AppError;
use super::pagination::{bool_param, build_page, page_number, uuid_param, QueryParams};
use crate::db::statuses as db;
use crate::AppState;

/// クエリからフィルタを組み立てる
///
/// `service`, `up`, `ordering`（`created_at` / `-created_at`）を解釈する。
pub fn status_filter(params: &QueryParams) -> Result<StatusFilter, ControlError> {
    let descending = match params.get("ordering").map(|s| s.trim()) {
        None | Some("") | Some("created_at") => false,
        Some("-created_at") => true,
        Some(other) => {
            return Err(CommonError::Validation(format!("Invalid ordering: {}", other)).into())
        }
    };

    Ok(StatusFilter {
        service: uuid_param(params, "service")?,
        up: bool_param(params, "up")?,
        descending,
    })
}

/// GET /api/v1/status/ - ステータス一覧
///
/// # Returns
/// * `200 OK` - `{"count", "next", "previous", "results"}`
/// * `400 Bad Request` - フィルタ値不正
pub async fn list_statuses(
    State(app_state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Page<Status>>, AppError> {
    let filter = status_filter(&params)?;
    let page = page_number(&params)?;
    let page_size = app_state.config.page_size;

    let (statuses, count) =
        db::filter_and_paginate(&app_state.db_pool, &filter, page, page_size).await?;
    Ok(Json(build_page(statuses, count, page, page_size)?))
}

/// GET /api/v1/status/:id/ - ステータス詳細
pub async fn get_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Status>, AppError> {
    let status = db::get_status(&app_state.db_pool, id)
        .await?
        .ok_or_else(|| ControlError::NotFound(format!("Status {}", id)))?;
    Ok(Json(status))
}

/// 書き込み系メソッドを405で拒否
pub async fn method_not_allowed(method: Method) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": format!("Method \"{}\" not allowed.", method) })),
    )
}
