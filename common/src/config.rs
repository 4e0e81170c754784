//! 設定管理
//!
//! ControlConfigの定義と読み込み（設定ファイル + `CONTROL_*` 環境変数）

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::CommonError;

/// 環境変数のプレフィックス（例: `CONTROL_PORT`）
pub const ENV_PREFIX: &str = "CONTROL";

/// サーバー設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlConfig {
    /// ホストアドレス (デフォルト: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号 (デフォルト: 8000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// データベースURL (デフォルト: "sqlite://control.db")
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// 定期ポーリング間隔（秒）(デフォルト: 60、0で無効)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// ヘルスチェック/トークン発行の外部呼び出しタイムアウト（秒）(デフォルト: 5)
    #[serde(default = "default_health_check_timeout")]
    pub health_check_timeout_secs: u64,

    /// ワーカーの同時実行数 (デフォルト: 4)
    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,

    /// 未完了タスク数の上限 (デフォルト: 1024)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Webhook配信タイムアウト（秒）(デフォルト: 10)
    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_secs: u64,

    /// 一覧APIの1ページ件数 (デフォルト: 50)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_database_url() -> String {
    "sqlite://control.db".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_health_check_timeout() -> u64 {
    5
}

fn default_worker_concurrency() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_webhook_timeout() -> u64 {
    10
}

fn default_page_size() -> u32 {
    50
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            poll_interval_secs: default_poll_interval(),
            health_check_timeout_secs: default_health_check_timeout(),
            worker_concurrency: default_worker_concurrency(),
            queue_capacity: default_queue_capacity(),
            webhook_timeout_secs: default_webhook_timeout(),
            page_size: default_page_size(),
        }
    }
}

impl ControlConfig {
    /// 設定を読み込む
    ///
    /// 優先順位: `CONTROL_*` 環境変数 > 設定ファイル > デフォルト値
    pub fn load(path: Option<&Path>) -> Result<Self, CommonError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: ControlConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 値の整合性を検証
    pub fn validate(&self) -> Result<(), CommonError> {
        if self.worker_concurrency == 0 {
            return Err(CommonError::Config(
                "worker_concurrency must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(CommonError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.health_check_timeout_secs == 0 {
            return Err(CommonError::Config(
                "health_check_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// バインドアドレス
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 外部呼び出しタイムアウト
    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_secs(self.health_check_timeout_secs)
    }

    /// Webhook配信タイムアウト
    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }

    /// 定期ポーリング間隔（無効時None）
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }
}
