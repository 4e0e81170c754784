//! Control Interface 共通ライブラリ
//!
//! サーバーとテストで共有する型・プロトコル・設定・エラー

#![warn(missing_docs)]

/// 設定管理
pub mod config;

/// エラー型
pub mod error;

/// REST API / 監視対象サービスとの通信メッセージ
pub mod protocol;

/// コアデータ型
pub mod types;
