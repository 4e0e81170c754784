//! バックグラウンドタスク
//!
//! ヘルスチェックとユーザートークン発行はリクエスト処理と切り離して
//! ワーカープールで実行する。キューはグローバルではなく `TaskQueue` ハンドルとして
//! AppStateに保持する。

use async_trait::async_trait;
use control_interface_common::error::ControlError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::health::poller::HealthPoller;
use crate::token::UserTokenIssuer;

/// 一括投入ヘルパー
pub mod dispatch;

/// ワーカープール
pub mod pool;

pub use dispatch::{enqueue_health_checks, enqueue_user_tokens};
pub use pool::{PoolStats, WorkerPool};

/// タスクの実行結果（完了メッセージ）
pub type TaskResult = Result<String, ControlError>;

/// キューに投入できるタスク
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// サービスのヘルスチェック
    PollService {
        /// 対象サービス
        service_id: Uuid,
    },
    /// ユーザートークン発行
    IssueUserToken {
        /// 対象サービス
        service_id: Uuid,
        /// 外部ユーザーID
        user_id: u64,
        /// メールアドレス
        email: String,
    },
}

impl Task {
    /// ログ用のタスク名
    pub fn name(&self) -> &'static str {
        match self {
            Self::PollService { .. } => "poll_service",
            Self::IssueUserToken { .. } => "issue_user_token",
        }
    }

    /// 対象サービスID
    pub fn service_id(&self) -> Uuid {
        match self {
            Self::PollService { service_id } | Self::IssueUserToken { service_id, .. } => {
                *service_id
            }
        }
    }
}

/// タスク実行器
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// タスクを1件実行
    async fn run(&self, task: Task) -> TaskResult;
}

/// 標準のタスク実行器（ポーラーとトークン発行器に振り分け）
#[derive(Clone)]
pub struct TaskExecutor {
    poller: HealthPoller,
    issuer: UserTokenIssuer,
}

impl TaskExecutor {
    /// 新しい実行器を作成
    pub fn new(poller: HealthPoller, issuer: UserTokenIssuer) -> Self {
        Self { poller, issuer }
    }
}

#[async_trait]
impl TaskRunner for TaskExecutor {
    async fn run(&self, task: Task) -> TaskResult {
        match task {
            Task::PollService { service_id } => self.poller.poll(service_id).await,
            Task::IssueUserToken {
                service_id,
                user_id,
                email,
            } => self.issuer.issue(service_id, user_id, &email).await,
        }
    }
}

pub(crate) struct QueuedTask {
    pub(crate) task: Task,
    pub(crate) reply: oneshot::Sender<TaskResult>,
}

/// タスクキュー（送信側ハンドル）
///
/// 投入は待たずに即座に返る。未完了（待機中 + 実行中）のタスク数は
/// `capacity` を超えない。
#[derive(Clone)]
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<QueuedTask>,
    pending: Arc<AtomicUsize>,
    capacity: usize,
}

impl TaskQueue {
    pub(crate) fn new(sender: mpsc::UnboundedSender<QueuedTask>, capacity: usize) -> Self {
        Self {
            sender,
            pending: Arc::new(AtomicUsize::new(0)),
            capacity: capacity.max(1),
        }
    }

    /// タスクを1件投入
    pub fn submit(&self, task: Task) -> Result<TaskHandle, ControlError> {
        let mut handles = self.submit_all(vec![task])?;
        handles.pop().ok_or(ControlError::QueueClosed)
    }

    /// タスクをまとめて投入
    ///
    /// 全件分の空きがなければ1件も投入せず `QueueFull` を返す。
    /// シャットダウン後は `QueueClosed`。
    pub fn submit_all(&self, tasks: Vec<Task>) -> Result<Vec<TaskHandle>, ControlError> {
        if self.is_closed() {
            return Err(ControlError::QueueClosed);
        }

        let count = tasks.len();
        let capacity = self.capacity;
        self.pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |pending| {
                (pending + count <= capacity).then_some(pending + count)
            })
            .map_err(|pending| {
                ControlError::QueueFull(format!(
                    "{} tasks requested, {} of {} slots in use",
                    count, pending, capacity
                ))
            })?;

        let mut handles = Vec::with_capacity(count);
        for (sent, task) in tasks.into_iter().enumerate() {
            let (reply, receiver) = oneshot::channel();
            if self.sender.send(QueuedTask { task, reply }).is_err() {
                // 送れなかった分の予約を戻す
                self.pending.fetch_sub(count - sent, Ordering::SeqCst);
                return Err(ControlError::QueueClosed);
            }
            handles.push(TaskHandle { receiver });
        }
        Ok(handles)
    }

    /// 未完了のタスク数
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// キューが閉じているか
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub(crate) fn pending_counter(&self) -> Arc<AtomicUsize> {
        self.pending.clone()
    }
}

/// 投入済みタスクの結果ハンドル
///
/// 破棄しても実行は継続する。
#[derive(Debug)]
pub struct TaskHandle {
    receiver: oneshot::Receiver<TaskResult>,
}

impl TaskHandle {
    /// タスクの完了を待つ
    pub async fn wait(self) -> TaskResult {
        self.receiver
            .await
            .unwrap_or(Err(ControlError::QueueClosed))
    }
}
