//! 書き込み後フック
//!
//! Registry / Poller / Token Issuer は書き込みが確定した後に `PostWriteHook` を呼ぶ。
//! 標準実装の `WebhookDispatcher` は購読中のWebhookへイベントを配信する。

use async_trait::async_trait;
use control_interface_common::types::{Hook, HookEventKind, Service, Status, UserServiceToken};
use reqwest::Client;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::db::hooks as db;

/// 書き込み後イベント
#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
    /// サービスが登録された
    ServiceAdded(Service),
    /// サービスが更新された
    ServiceChanged(Service),
    /// ポーリング結果が記録された
    StatusAdded(Status),
    /// ユーザートークンが保存された
    UserServiceTokenAdded(UserServiceToken),
}

impl HookEvent {
    /// イベント種別
    pub fn kind(&self) -> HookEventKind {
        match self {
            Self::ServiceAdded(_) => HookEventKind::ServiceAdded,
            Self::ServiceChanged(_) => HookEventKind::ServiceChanged,
            Self::StatusAdded(_) => HookEventKind::StatusAdded,
            Self::UserServiceTokenAdded(_) => HookEventKind::UserServiceTokenAdded,
        }
    }

    /// 配信用にエンティティをシリアライズ
    pub fn data(&self) -> Value {
        let value = match self {
            Self::ServiceAdded(service) | Self::ServiceChanged(service) => {
                serde_json::to_value(service)
            }
            Self::StatusAdded(status) => serde_json::to_value(status),
            Self::UserServiceTokenAdded(token) => serde_json::to_value(token),
        };
        value.unwrap_or(Value::Null)
    }
}

/// 書き込み後フック
///
/// 実装は書き込み結果に影響を与えてはならない（失敗はログのみ）。
#[async_trait]
pub trait PostWriteHook: Send + Sync {
    /// 書き込み確定後に呼ばれる
    async fn after_write(&self, event: HookEvent);
}

/// 共有可能なフック
pub type SharedHook = Arc<dyn PostWriteHook>;

/// 何もしないフック
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

#[async_trait]
impl PostWriteHook for NoopHook {
    async fn after_write(&self, _event: HookEvent) {}
}

/// Webhook配信
///
/// イベントに一致するHookを読み込み、各targetへ別タスクでPOSTする。
#[derive(Clone)]
pub struct WebhookDispatcher {
    pool: SqlitePool,
    client: Client,
}

impl WebhookDispatcher {
    /// 新しいディスパッチャを作成
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { pool, client }
    }

    /// 配信ペイロードを組み立てる
    pub fn payload(hook: &Hook, event: &HookEvent) -> Value {
        json!({
            "hook": {
                "id": hook.id,
                "event": hook.event.as_str(),
                "target": hook.target,
            },
            "data": event.data(),
        })
    }

    async fn deliver(client: Client, hook: Hook, payload: Value) {
        match client.post(&hook.target).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(hook_id = %hook.id, event = %hook.event, "Webhook delivered");
            }
            Ok(response) => {
                warn!(
                    hook_id = %hook.id,
                    event = %hook.event,
                    status = %response.status(),
                    "Webhook target returned error status"
                );
            }
            Err(e) => {
                warn!(
                    hook_id = %hook.id,
                    event = %hook.event,
                    error = %e,
                    "Webhook delivery failed"
                );
            }
        }
    }
}

#[async_trait]
impl PostWriteHook for WebhookDispatcher {
    async fn after_write(&self, event: HookEvent) {
        let hooks = match db::list_for_event(&self.pool, event.kind()).await {
            Ok(hooks) => hooks,
            Err(e) => {
                error!(event = %event.kind(), "Failed to load hooks: {}", e);
                return;
            }
        };

        for hook in hooks {
            let payload = Self::payload(&hook, &event);
            tokio::spawn(Self::deliver(self.client.clone(), hook, payload));
        }
    }
}
