//! 全サービスへのタスク一括投入

use control_interface_common::error::ControlError;
use control_interface_common::protocol::UserTokenRequest;
use tracing::info;

use super::{Task, TaskHandle, TaskQueue};
use crate::registry::ServiceRegistry;

/// 全サービスにヘルスチェックを1件ずつ投入
///
/// タスクの実行は待たない。キューに全件分の空きがなければ `QueueFull`。
///
/// # Returns
/// * `Ok(Vec<TaskHandle>)` - 投入したタスク（件数 = サービス数）
pub async fn enqueue_health_checks(
    registry: &ServiceRegistry,
    queue: &TaskQueue,
) -> Result<Vec<TaskHandle>, ControlError> {
    let tasks = registry
        .list()
        .await?
        .into_iter()
        .map(|service| Task::PollService {
            service_id: service.id,
        })
        .collect();
    let handles = queue.submit_all(tasks)?;

    info!(count = handles.len(), "Health checks enqueued");
    Ok(handles)
}

/// 全サービスにユーザートークン発行を1件ずつ投入
///
/// 入力は投入前に検証する。
pub async fn enqueue_user_tokens(
    registry: &ServiceRegistry,
    queue: &TaskQueue,
    req: &UserTokenRequest,
) -> Result<Vec<TaskHandle>, ControlError> {
    req.validate()?;

    let tasks = registry
        .list()
        .await?
        .into_iter()
        .map(|service| Task::IssueUserToken {
            service_id: service.id,
            user_id: req.user_id,
            email: req.email.clone(),
        })
        .collect();
    let handles = queue.submit_all(tasks)?;

    info!(
        count = handles.len(),
        user_id = req.user_id,
        "User token requests enqueued"
    );
    Ok(handles)
}
