//! ヘルスポーラー
//!
//! 1サービスに対して `GET <url>/api/health` を送り、結果をStatusとして記録する。

use chrono::Utc;
use control_interface_common::error::ControlError;
use control_interface_common::types::{Service, Status};
use reqwest::Client;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::response::HealthResponse;
use crate::db::{services, statuses};
use crate::hooks::{HookEvent, SharedHook};

/// ヘルスポーラー
#[derive(Clone)]
pub struct HealthPoller {
    pool: SqlitePool,
    client: Client,
    hook: SharedHook,
}

impl HealthPoller {
    /// 新しいポーラーを作成
    ///
    /// `timeout` は1回のヘルスチェック全体（接続〜ボディ受信）の上限。
    pub fn new(pool: SqlitePool, hook: SharedHook, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { pool, client, hook }
    }

    /// サービスをポーリングしてStatusを記録
    ///
    /// 通信失敗や解釈不能なレスポンスはDOWNとして記録し、エラーにはしない。
    /// サービスが存在しない場合（または永続化失敗）のみエラーを返す。
    ///
    /// # Returns
    /// * `Ok(String)` - `"Completed healthcheck for <name>"`
    pub async fn poll(&self, service_id: Uuid) -> Result<String, ControlError> {
        let service = services::get_service(&self.pool, service_id)
            .await?
            .ok_or(ControlError::ServiceNotFound(service_id))?;

        let response = self.fetch(&service).await;
        let (up, result) = response.into_outcome();

        let status = Status {
            id: Uuid::new_v4(),
            service: service.id,
            up,
            result,
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
        };
        statuses::record_poll_outcome(&self.pool, &status).await?;

        info!(
            service_id = %service.id,
            service_name = %service.name,
            up,
            "Health check recorded"
        );

        self.hook.after_write(HookEvent::StatusAdded(status)).await;

        Ok(format!("Completed healthcheck for <{}>", service.name))
    }

    /// ヘルスエンドポイントを呼び出して結果を分類
    pub async fn fetch(&self, service: &Service) -> HealthResponse {
        let url = service.health_url();
        let result = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", service.token))
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    service_id = %service.id,
                    service_name = %service.name,
                    timeout = e.is_timeout(),
                    error = %e,
                    "Health check request failed"
                );
                return HealthResponse::Unparseable;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(
                service_id = %service.id,
                status = %status,
                "Health check returned non-success status"
            );
            return HealthResponse::Unparseable;
        }

        match response.bytes().await {
            Ok(body) => HealthResponse::from_body(&body),
            Err(e) => {
                warn!(
                    service_id = %service.id,
                    error = %e,
                    "Failed to read health check body"
                );
                HealthResponse::Unparseable
            }
        }
    }
}
