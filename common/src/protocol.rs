//! 通信プロトコル定義
//!
//! REST APIのリクエスト/レスポンス、および監視対象サービスとの通信メッセージ

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;
use uuid::Uuid;

use crate::error::CommonError;

/// サービス登録リクエスト
///
/// `up` を送ってきても無視する（サーバー側で常にfalse）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateServiceRequest {
    /// 表示名
    pub name: String,
    /// ベースURL
    pub url: String,
    /// サービス呼び出し用トークン
    pub token: String,
}

impl CreateServiceRequest {
    /// 入力値を検証
    pub fn validate(&self) -> Result<(), CommonError> {
        validate_service_fields(&self.name, &self.url, &self.token)
    }
}

/// サービス更新リクエスト（全置換）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateServiceRequest {
    /// 表示名
    pub name: String,
    /// ベースURL
    pub url: String,
    /// サービス呼び出し用トークン
    pub token: String,
}

impl UpdateServiceRequest {
    /// 入力値を検証
    pub fn validate(&self) -> Result<(), CommonError> {
        validate_service_fields(&self.name, &self.url, &self.token)
    }
}

fn validate_service_fields(name: &str, url: &str, token: &str) -> Result<(), CommonError> {
    if name.trim().is_empty() {
        return Err(CommonError::Validation("Name is required".to_string()));
    }
    validate_http_url(url, "URL")?;
    if token.trim().is_empty() {
        return Err(CommonError::Validation("Token is required".to_string()));
    }
    Ok(())
}

/// 絶対http(s) URLであることを検証
///
/// スキームがhttp/httpsで、ホストを持つURLのみ許可する。
/// `field` はエラーメッセージに使う項目名。
pub fn validate_http_url(value: &str, field: &str) -> Result<(), CommonError> {
    let invalid = || CommonError::Validation(format!("{} must be an absolute http(s) URL", field));
    // Url::parse は前後の空白を黙って取り除くので先に弾く
    if value.trim() != value {
        return Err(invalid());
    }
    let parsed = Url::parse(value).map_err(|_| invalid())?;
    let has_host = parsed.host_str().is_some_and(|host| !host.is_empty());
    if !matches!(parsed.scheme(), "http" | "https") || !has_host {
        return Err(invalid());
    }
    Ok(())
}

/// ユーザートークン一括発行リクエスト（管理者用トリガー）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserTokenRequest {
    /// 外部ユーザーID
    pub user_id: u64,
    /// メールアドレス
    pub email: String,
}

impl UserTokenRequest {
    /// 入力値を検証
    pub fn validate(&self) -> Result<(), CommonError> {
        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(CommonError::Validation(
                "Enter a valid email address".to_string(),
            )),
        }
    }
}

/// ユーザートークン一括発行レスポンス
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserTokenTriggerResponse {
    /// 受付済みフラグ
    pub user_service_token_initiated: bool,
    /// 投入したタスク数（= サービス数）
    pub count: usize,
}

/// ヘルスチェック一括実行レスポンス
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCheckTriggerResponse {
    /// 受付済みフラグ
    pub healthcheck_initiated: bool,
    /// 投入したタスク数（= サービス数）
    pub count: usize,
}

/// ログインリクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// ユーザー名
    pub username: String,
    /// パスワード
    pub password: String,
}

/// ログインレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// APIトークン（平文、この時だけ返す）
    pub token: String,
}

/// Webhook登録リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHookRequest {
    /// イベント名（例: "status.added"）
    pub event: String,
    /// 配信先URL
    pub target: String,
}

/// `/api/health` のレスポンス形式
///
/// 監視対象サービスが返す形式であり、本サービス自身の `/api/health/` も同じ形式で応答する。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HealthReport {
    /// 稼働中かどうか（欠落時false）
    #[serde(default)]
    pub up: bool,
    /// チェック名→詳細（欠落・null時は空）
    #[serde(default, deserialize_with = "deserialize_result_map")]
    pub result: Map<String, Value>,
}

fn deserialize_result_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// ユーザートークン発行APIのレスポンス
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssuedTokenResponse {
    /// 発行されたトークン
    pub token: String,
}

/// ページングされた一覧レスポンス
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    /// フィルタ後の総件数
    pub count: u64,
    /// 次ページ番号
    pub next: Option<u32>,
    /// 前ページ番号
    pub previous: Option<u32>,
    /// このページの要素
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// 件数とページ番号からページ情報を組み立てる
    pub fn new(results: Vec<T>, count: u64, page: u32, page_size: u32) -> Self {
        let page_size = page_size.max(1) as u64;
        let next = if (page as u64) * page_size < count {
            Some(page + 1)
        } else {
            None
        };
        let previous = if page > 1 { Some(page - 1) } else { None };
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// 一覧取得用のフィルタ（Status）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFilter {
    /// サービスIDで絞り込み
    pub service: Option<Uuid>,
    /// up/downで絞り込み
    pub up: Option<bool>,
    /// 作成日時の降順で返すか
    pub descending: bool,
}

/// 一覧取得用のフィルタ（UserServiceToken）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserServiceTokenFilter {
    /// サービスIDで絞り込み
    pub service: Option<Uuid>,
    /// 外部ユーザーIDで絞り込み
    pub user_id: Option<u64>,
    /// メールアドレスで絞り込み
    pub email: Option<String>,
}

/// クエリ文字列の真偽値を解釈（"True"/"true"/"1"等）
pub fn parse_query_bool(value: &str) -> Result<bool, CommonError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(CommonError::Validation(format!(
            "Invalid boolean value: {}",
            other
        ))),
    }
}
