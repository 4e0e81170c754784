//! Control Interface Server
//!
//! 登録済みサービスのヘルスチェックとユーザートークン発行を管理する中央サーバー

#![warn(missing_docs)]

/// REST APIハンドラー
pub mod api;

/// 認証・認可機能
pub mod auth;

/// CLIインターフェース
pub mod cli;

/// データベースアクセス
pub mod db;

/// ヘルスチェック（ポーラーと定期スケジューラー）
pub mod health;

/// 書き込み後フック（Webhook配信）
pub mod hooks;

/// ロギング初期化ユーティリティ
pub mod logging;

/// サービス登録管理
pub mod registry;

/// サーバー起動と終了処理
pub mod server;

/// 協調シャットダウン
pub mod shutdown;

/// 非同期タスクキューとワーカープール
pub mod tasks;

/// ユーザーサービストークン発行
pub mod token;

use control_interface_common::config::ControlConfig;
use std::sync::Arc;

use crate::health::HealthPoller;
use crate::hooks::SharedHook;
use crate::registry::ServiceRegistry;
use crate::shutdown::ShutdownController;
use crate::tasks::{PoolStats, TaskExecutor, TaskQueue, WorkerPool};
use crate::token::UserTokenIssuer;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// データベース接続プール
    pub db_pool: sqlx::SqlitePool,
    /// サービスレジストリ
    pub registry: ServiceRegistry,
    /// タスク投入キュー
    pub task_queue: TaskQueue,
    /// サーバー設定
    pub config: Arc<ControlConfig>,
    /// ワーカープールの実行統計
    pub pool_stats: Arc<PoolStats>,
    /// シャットダウン制御
    pub shutdown: ShutdownController,
}

impl AppState {
    /// 状態を組み立て、ワーカープールを起動する
    ///
    /// 返された `WorkerPool` はシャットダウン時に `join` すること。
    pub fn build(
        db_pool: sqlx::SqlitePool,
        config: ControlConfig,
        hook: SharedHook,
        shutdown: ShutdownController,
    ) -> (AppState, WorkerPool) {
        let timeout = config.health_check_timeout();
        let registry = ServiceRegistry::new(db_pool.clone(), hook.clone());
        let poller = HealthPoller::new(db_pool.clone(), hook.clone(), timeout);
        let issuer = UserTokenIssuer::new(db_pool.clone(), hook, timeout);

        let (task_queue, pool) = WorkerPool::start(
            Arc::new(TaskExecutor::new(poller, issuer)),
            config.worker_concurrency,
            config.queue_capacity,
            shutdown.clone(),
        );

        let state = AppState {
            db_pool,
            registry,
            task_queue,
            config: Arc::new(config),
            pool_stats: pool.stats(),
            shutdown,
        };
        (state, pool)
    }
}
