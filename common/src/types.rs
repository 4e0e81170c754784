//! 共通型定義
//!
//! Service, Status, UserServiceToken等のコアデータ型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CommonError;

/// 監視対象サービス
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    /// 一意識別子
    pub id: Uuid,
    /// 表示名
    pub name: String,
    /// ベースURL（`/api/health`はこの下に付く）
    pub url: String,
    /// サービス呼び出し用トークン
    pub token: String,
    /// 直近のポーリング結果（初期値false）
    pub up: bool,
    /// 作成者（Noneはシステム）
    pub created_by: Option<Uuid>,
    /// 最終更新者（Noneはシステム）
    pub updated_by: Option<Uuid>,
    /// 作成日時
    pub created_at: DateTime<Utc>,
    /// 更新日時
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// 新規登録用のサービスを作成
    ///
    /// `up` は呼び出し元の入力に関わらず常に `false` で開始する。
    pub fn new(name: String, url: String, token: String, created_by: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            url,
            token,
            up: false,
            created_by,
            updated_by: created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// ヘルスチェックURL
    pub fn health_url(&self) -> String {
        format!("{}/api/health", self.url.trim_end_matches('/'))
    }

    /// ユーザートークン発行URL
    pub fn user_token_url(&self) -> String {
        format!("{}/api/v1/user/token/", self.url.trim_end_matches('/'))
    }
}

/// ポーリング結果の記録（追記専用）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    /// 一意識別子
    pub id: Uuid,
    /// 所属サービスID
    pub service: Uuid,
    /// 判定結果
    pub up: bool,
    /// チェック名→詳細のマップ、または `{"error": ...}`
    pub result: Map<String, Value>,
    /// 作成者（Noneはシステム）
    pub created_by: Option<Uuid>,
    /// 最終更新者（Noneはシステム）
    pub updated_by: Option<Uuid>,
    /// 作成日時（並び順に使用）
    pub created_at: DateTime<Utc>,
}

/// ユーザー毎のサービストークン
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserServiceToken {
    /// 一意識別子
    pub id: Uuid,
    /// 所属サービスID
    pub service: Uuid,
    /// 外部ユーザーID
    pub user_id: u64,
    /// メールアドレス
    pub email: String,
    /// 発行されたトークン
    pub token: String,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}

/// APIユーザー（パスワードハッシュは含まない）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// 一意識別子
    pub id: Uuid,
    /// ユーザー名
    pub username: String,
    /// メールアドレス
    pub email: String,
    /// 管理者フラグ
    pub is_admin: bool,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}

/// Webhookイベント種別
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HookEventKind {
    /// サービス登録
    #[serde(rename = "service.added")]
    ServiceAdded,
    /// サービス更新
    #[serde(rename = "service.changed")]
    ServiceChanged,
    /// ステータス追加
    #[serde(rename = "status.added")]
    StatusAdded,
    /// ユーザートークン追加
    #[serde(rename = "userservicetoken.added")]
    UserServiceTokenAdded,
}

impl HookEventKind {
    /// 全イベント種別
    pub const ALL: [HookEventKind; 4] = [
        Self::ServiceAdded,
        Self::ServiceChanged,
        Self::StatusAdded,
        Self::UserServiceTokenAdded,
    ];

    /// HookEventKindを文字列に変換
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceAdded => "service.added",
            Self::ServiceChanged => "service.changed",
            Self::StatusAdded => "status.added",
            Self::UserServiceTokenAdded => "userservicetoken.added",
        }
    }
}

impl FromStr for HookEventKind {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CommonError::Validation(format!("Unknown hook event: {}", s)))
    }
}

impl std::fmt::Display for HookEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 登録済みWebhook
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hook {
    /// 一意識別子
    pub id: Uuid,
    /// 所有ユーザーID
    pub user: Uuid,
    /// 購読イベント
    pub event: HookEventKind,
    /// 配信先URL
    pub target: String,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}
