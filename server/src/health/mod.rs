//! ヘルスチェック
//!
//! 監視対象サービスのポーリング、レスポンス解釈、定期実行

/// 1サービス分のポーリング
pub mod poller;

/// レスポンスの解釈
pub mod response;

/// 定期実行
pub mod scheduler;

pub use poller::HealthPoller;
pub use response::{HealthResponse, UNPARSEABLE_MESSAGE};
pub use scheduler::PollScheduler;
