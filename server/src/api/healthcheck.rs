//! ヘルスチェック関連API
//!
//! 自身の稼働状態と、全サービスへのヘルスチェック投入トリガー

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use control_interface_common::protocol::{HealthCheckTriggerResponse, HealthReport};
use serde_json::{json, Map, Value};

use super::error::AppError;
use crate::db::migrations::ping;
use crate::tasks::enqueue_health_checks;
use crate::AppState;

/// GET /api/health/ - 自身の稼働状態（認証不要）
///
/// 監視対象サービスと同じ `{"up", "result"}` 形式で応答する。
/// `result.task_queue` はワーカープールの未完了・成功・失敗件数。
///
/// # Returns
/// * `200 OK` - DBに到達できる
/// * `503 Service Unavailable` - DBに到達できない
pub async fn health(State(app_state): State<AppState>) -> impl IntoResponse {
    let mut result = Map::new();
    let up = match ping(&app_state.db_pool).await {
        Ok(()) => {
            result.insert("database".to_string(), Value::from("Accessible"));
            true
        }
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            result.insert("database".to_string(), Value::from("Inaccessible"));
            false
        }
    };

    result.insert(
        "task_queue".to_string(),
        json!({
            "pending": app_state.task_queue.pending(),
            "completed": app_state.pool_stats.completed(),
            "failed": app_state.pool_stats.failed(),
        }),
    );

    let status = if up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(HealthReport { up, result }))
}

/// POST /api/v1/healthcheck/trigger/ - 全サービスにヘルスチェックを投入
///
/// 管理者限定。ポーリングの完了は待たない。
///
/// # Returns
/// * `201 Created` - `{"healthcheck_initiated": true, "count": N}`
/// * `503 Service Unavailable` - キューに全サービス分の空きがない
pub async fn trigger_health_checks(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let handles = enqueue_health_checks(&app_state.registry, &app_state.task_queue).await?;

    Ok((
        StatusCode::CREATED,
        Json(HealthCheckTriggerResponse {
            healthcheck_initiated: true,
            count: handles.len(),
        }),
    ))
}
