//! CLI module for control-interface
//!
//! `serve`（デフォルト）でサーバーを起動し、`create-admin` で管理者を作成する。

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Control Interface - health polling control plane for registered services
#[derive(Parser, Debug)]
#[command(name = "control-interface")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    CONTROL_HOST                   Bind address (default: 0.0.0.0)
    CONTROL_PORT                   Listen port (default: 8000)
    CONTROL_DATABASE_URL           Database URL (default: sqlite://control.db)
    CONTROL_POLL_INTERVAL_SECS     Scheduled poll interval, 0 disables (default: 60)
    CONTROL_LOG                    Log filter (default: info)
    CONTROL_ADMIN_USERNAME         Initial admin username
    CONTROL_ADMIN_PASSWORD         Initial admin password
"#)]
pub struct Cli {
    /// 設定ファイルのパス
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// サブコマンド（省略時は serve）
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// サブコマンド
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// サーバーを起動
    Serve,
    /// 管理者ユーザーを作成
    CreateAdmin {
        /// ユーザー名
        #[arg(long)]
        username: String,
        /// パスワード
        #[arg(long, env = "CONTROL_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        /// メールアドレス
        #[arg(long, default_value = "")]
        email: String,
    },
}

impl Cli {
    /// サブコマンド（省略時は `Serve`）
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
