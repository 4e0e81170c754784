//! サービス管理API
//!
//! 監視対象サービスのCRUD。`up` はポーリングのみが更新する。

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use control_interface_common::protocol::{CreateServiceRequest, Page, UpdateServiceRequest};
use control_interface_common::types::Service;
use uuid::Uuid;

use super::error::{ApiJson, AppError};
use super::pagination::{build_page, page_number, QueryParams};
use crate::auth::AuthUser;
use crate::AppState;

/// GET /api/v1/service/ - サービス一覧（登録順、ページング）
pub async fn list_services(
    State(app_state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Page<Service>>, AppError> {
    let page = page_number(&params)?;
    let page_size = app_state.config.page_size;

    let (services, count) = app_state.registry.list_page(page, page_size).await?;
    Ok(Json(build_page(services, count, page, page_size)?))
}

/// POST /api/v1/service/ - サービス登録
///
/// # Returns
/// * `201 Created` - 登録されたサービス（`up` は常にfalse）
/// * `400 Bad Request` - 入力不正
pub async fn create_service(
    State(app_state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    ApiJson(request): ApiJson<CreateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = app_state.registry.register(request, Some(user.id)).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// GET /api/v1/service/:id/ - サービス詳細
pub async fn get_service(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Service>, AppError> {
    Ok(Json(app_state.registry.get(id).await?))
}

/// PUT /api/v1/service/:id/ - サービス更新（name/url/token）
///
/// ボディの `up` は無視する。
pub async fn update_service(
    State(app_state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdateServiceRequest>,
) -> Result<Json<Service>, AppError> {
    let service = app_state
        .registry
        .update(id, request, Some(user.id))
        .await?;
    Ok(Json(service))
}

/// DELETE /api/v1/service/:id/ - サービス削除（Status/トークンも削除）
///
/// # Returns
/// * `204 No Content` - 削除成功
/// * `404 Not Found` - 該当なし
pub async fn delete_service(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.registry.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
