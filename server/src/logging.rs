//! ロギング初期化
//!
//! `CONTROL_LOG`（なければ `RUST_LOG`）でフィルタを指定する。
//! 例: `CONTROL_LOG=control_interface=debug,sqlx=warn`

use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// ログフィルタを指定する環境変数
pub const LOG_ENV: &str = "CONTROL_LOG";

const DEFAULT_FILTER: &str = "info";

static INIT: Once = Once::new();

/// tracingサブスクライバーを初期化（複数回呼んでも1回だけ有効）
pub fn init() {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(env_filter())
            .init();
    });
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
