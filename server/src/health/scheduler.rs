//! ポーリングスケジューラ
//!
//! 一定間隔で全サービスのヘルスチェックをキューに投入する。
//! 前回分が残っている間は投入しない。

use control_interface_common::error::ControlError;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::registry::ServiceRegistry;
use crate::shutdown::ShutdownController;
use crate::tasks::{enqueue_health_checks, TaskQueue};

/// ポーリングスケジューラ
#[derive(Clone)]
pub struct PollScheduler {
    registry: ServiceRegistry,
    queue: TaskQueue,
    interval: Duration,
}

impl PollScheduler {
    /// 新しいスケジューラを作成
    pub fn new(registry: ServiceRegistry, queue: TaskQueue, interval: Duration) -> Self {
        Self {
            registry,
            queue,
            interval,
        }
    }

    /// バックグラウンドで開始
    pub fn start(self, shutdown: ShutdownController) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run_loop(shutdown).await;
        })
    }

    /// スケジューラループ
    async fn run_loop(&self, shutdown: ShutdownController) {
        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 最初のtickは即座に完了するのでスキップ
        timer.tick().await;

        info!(
            interval_secs = self.interval.as_secs(),
            "Poll scheduler started"
        );

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = timer.tick() => {}
            }

            if let Err(e) = self.tick().await {
                error!("Failed to dispatch scheduled health checks: {}", e);
            }
        }

        info!("Poll scheduler stopped");
    }

    /// 1回分の投入（投入件数を返す）
    pub async fn tick(&self) -> Result<usize, ControlError> {
        let pending = self.queue.pending();
        if pending > 0 {
            debug!(pending, "Previous health checks still pending, skipping round");
            return Ok(0);
        }

        // 結果は待たない
        let handles = enqueue_health_checks(&self.registry, &self.queue).await?;
        Ok(handles.len())
    }
}
