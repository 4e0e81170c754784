//! データベースアクセス層
//!
//! SQLiteベースのデータ永続化

use chrono::{DateTime, SecondsFormat, Utc};
use control_interface_common::error::ControlError;
use uuid::Uuid;

/// データベースマイグレーション
pub mod migrations;

/// 監視対象サービス
pub mod services;

/// ポーリング結果（追記専用）
pub mod statuses;

/// ユーザー毎のサービストークン
pub mod user_service_tokens;

/// ユーザー管理
pub mod users;

/// APIトークン管理
pub mod api_tokens;

/// Webhook管理
pub mod hooks;

/// 日時をDB保存形式に変換
///
/// 固定幅（ナノ秒、`Z`）にして文字列順 = 時刻順とする。
pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// DB保存形式の日時を復元
///
/// 壊れた値は `ControlError::Database` とし、別の値で置き換えない。
pub(crate) fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, ControlError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ControlError::Database(format!("Invalid timestamp in {}: {}", column, e)))
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> Result<Uuid, ControlError> {
    Uuid::parse_str(value)
        .map_err(|e| ControlError::Database(format!("Invalid UUID in {}: {}", column, e)))
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    column: &str,
) -> Result<Option<Uuid>, ControlError> {
    value.map(|s| parse_uuid(&s, column)).transpose()
}
