//! ユーザーサービストークン発行
//!
//! 監視対象サービスの `POST <url>/api/v1/user/token/` でユーザー毎のトークンを取得して保存する。

use chrono::Utc;
use control_interface_common::error::ControlError;
use control_interface_common::protocol::IssuedTokenResponse;
use control_interface_common::types::UserServiceToken;
use reqwest::Client;
use serde_json::json;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::db::{services, user_service_tokens};
use crate::hooks::{HookEvent, SharedHook};

/// ユーザートークン発行
#[derive(Clone)]
pub struct UserTokenIssuer {
    pool: SqlitePool,
    client: Client,
    hook: SharedHook,
}

impl UserTokenIssuer {
    /// 新しい発行器を作成
    pub fn new(pool: SqlitePool, hook: SharedHook, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { pool, client, hook }
    }

    /// サービスにトークンを要求して保存
    ///
    /// 通信失敗・非2xx・`token` 欠落はいずれもエラー（行は書き込まない）。
    ///
    /// # Returns
    /// * `Ok(String)` - `"Completed user token request for <name>"`
    pub async fn issue(
        &self,
        service_id: Uuid,
        user_id: u64,
        email: &str,
    ) -> Result<String, ControlError> {
        let service = services::get_service(&self.pool, service_id)
            .await?
            .ok_or(ControlError::ServiceNotFound(service_id))?;

        let response = self
            .client
            .post(service.user_token_url())
            .header("Authorization", format!("Token {}", service.token))
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ControlError::Timeout(format!("User token request to {}: {}", service.name, e))
                } else {
                    ControlError::Http(format!("User token request to {}: {}", service.name, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ControlError::Http(format!(
                "User token request to {} returned {}",
                service.name, status
            )));
        }

        let issued: IssuedTokenResponse = response.json().await.map_err(|e| {
            ControlError::Http(format!(
                "Invalid user token response from {}: {}",
                service.name, e
            ))
        })?;

        let token = UserServiceToken {
            id: Uuid::new_v4(),
            service: service.id,
            user_id,
            email: email.to_string(),
            token: issued.token,
            created_at: Utc::now(),
        };
        user_service_tokens::create_token(&self.pool, &token).await?;

        info!(
            service_id = %service.id,
            service_name = %service.name,
            user_id,
            "User service token stored"
        );

        self.hook
            .after_write(HookEvent::UserServiceTokenAdded(token))
            .await;

        Ok(format!("Completed user token request for <{}>", service.name))
    }
}
