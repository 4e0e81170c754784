//! ワーカープール
//!
//! キューから取り出したタスクを最大 `concurrency` 件まで並行実行する。
//! 未完了数のカウンタはタスクの完了時と、シャットダウンで破棄した時に減らす。
//! 失敗したタスクは再試行せず、ログと失敗カウンタに記録する。

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{QueuedTask, TaskQueue, TaskRunner};
use crate::shutdown::ShutdownController;

/// ワーカープールの実行統計
#[derive(Debug, Default)]
pub struct PoolStats {
    completed: AtomicU64,
    failed: AtomicU64,
}

impl PoolStats {
    /// 成功したタスク数
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// 失敗したタスク数
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// ワーカープール
pub struct WorkerPool {
    stats: Arc<PoolStats>,
    dispatcher: JoinHandle<()>,
}

impl WorkerPool {
    /// プールを起動し、投入用の `TaskQueue` を返す
    ///
    /// `capacity` は未完了タスク数の上限。
    /// `shutdown` 要求後は新規タスクを受け付けず、実行中のタスクの完了を待って終了する。
    pub fn start(
        runner: Arc<dyn TaskRunner>,
        concurrency: usize,
        capacity: usize,
        shutdown: ShutdownController,
    ) -> (TaskQueue, WorkerPool) {
        let concurrency = concurrency.max(1);
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue = TaskQueue::new(sender, capacity);
        let stats = Arc::new(PoolStats::default());

        let dispatcher = tokio::spawn(dispatch_loop(
            receiver,
            runner,
            concurrency,
            queue.pending_counter(),
            stats.clone(),
            shutdown,
        ));

        info!(concurrency, capacity, "Worker pool started");

        (queue, WorkerPool { stats, dispatcher })
    }

    /// 実行統計
    pub fn stats(&self) -> Arc<PoolStats> {
        self.stats.clone()
    }

    /// 終了を待つ
    pub async fn join(self) {
        if let Err(e) = self.dispatcher.await {
            error!("Worker pool dispatcher panicked: {}", e);
        }
    }
}

async fn dispatch_loop(
    mut receiver: mpsc::UnboundedReceiver<QueuedTask>,
    runner: Arc<dyn TaskRunner>,
    concurrency: usize,
    pending: Arc<AtomicUsize>,
    stats: Arc<PoolStats>,
    shutdown: ShutdownController,
) {
    let semaphore = Arc::new(Semaphore::new(concurrency));

    loop {
        let queued = tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            next = receiver.recv() => match next {
                Some(queued) => queued,
                None => break,
            },
        };

        // 空きワーカーが出るまで次のタスクを取り出さない
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        let runner = runner.clone();
        let pending = pending.clone();
        let stats = stats.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let QueuedTask { task, reply } = queued;
            let name = task.name();
            let service_id = task.service_id();

            let result = runner.run(task).await;
            // 統計より先に戻す
            pending.fetch_sub(1, Ordering::SeqCst);
            match &result {
                Ok(message) => {
                    stats.completed.fetch_add(1, Ordering::Relaxed);
                    debug!(task = name, service_id = %service_id, "{}", message);
                }
                Err(e) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    error!(task = name, service_id = %service_id, error = %e, "Task failed");
                }
            }
            // 受信側が破棄されていても構わない
            let _ = reply.send(result);
        });
    }

    // 新規受付を止め、未実行のタスクは破棄する（ハンドル側には QueueClosed が返る）
    receiver.close();
    while receiver.try_recv().is_ok() {
        pending.fetch_sub(1, Ordering::SeqCst);
    }

    // 実行中のタスクの完了を待つ
    let _ = semaphore.acquire_many(concurrency as u32).await;
    info!(
        completed = stats.completed(),
        failed = stats.failed(),
        "Worker pool stopped"
    );
}
