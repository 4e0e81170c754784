//! サーバー起動
//!
//! DB初期化 → 管理者作成 → ワーカープール/スケジューラー起動 → HTTP待受。
//! 終了シグナルで新規受付を止め、実行中のタスクを待ってから終了する。

use control_interface_common::config::ControlConfig;
use control_interface_common::error::ControlError;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api;
use crate::auth::bootstrap::create_admin_from_env;
use crate::db::migrations::initialize_database;
use crate::health::PollScheduler;
use crate::hooks::{SharedHook, WebhookDispatcher};
use crate::shutdown::ShutdownController;
use crate::AppState;

/// サーバーを起動し、終了シグナルを受けるまで待機
pub async fn run(config: ControlConfig) -> Result<(), ControlError> {
    info!("Control Interface v{}", env!("CARGO_PKG_VERSION"));

    // データベース接続プールを最初に作成（他コンポーネントが依存）
    let db_pool = initialize_database(&config.database_url).await?;

    if let Some(username) = create_admin_from_env(&db_pool).await? {
        info!("Admin user available: {}", username);
    }

    let hook: SharedHook = Arc::new(WebhookDispatcher::new(
        db_pool.clone(),
        config.webhook_timeout(),
    ));
    let shutdown = ShutdownController::default();
    let (state, workers) = AppState::build(db_pool, config, hook, shutdown.clone());

    let scheduler = match state.config.poll_interval() {
        Some(interval) => Some(
            PollScheduler::new(state.registry.clone(), state.task_queue.clone(), interval)
                .start(shutdown.clone()),
        ),
        None => {
            info!("Scheduled polling disabled");
            None
        }
    };

    let bind_addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| ControlError::Internal(format!("Failed to bind to {}: {}", bind_addr, e)))?;

    info!("Control interface listening on {}", bind_addr);

    let app = api::create_app(state);
    let signal_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, stopping");
            signal_shutdown.request_shutdown();
        })
        .await
        .map_err(|e| ControlError::Internal(format!("Server error: {}", e)))?;

    // HTTP以外の経路で終了した場合も確実に止める
    shutdown.request_shutdown();
    if let Some(scheduler) = scheduler {
        if let Err(e) = scheduler.await {
            warn!("Poll scheduler task ended abnormally: {}", e);
        }
    }
    workers.join().await;

    info!("Control interface stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
