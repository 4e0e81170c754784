//! 認証
//!
//! パスワードログインで発行する不透明なAPIトークンと管理者フラグ

/// 管理者アカウントの作成
pub mod bootstrap;

/// 認証ミドルウェア
pub mod middleware;

/// パスワードハッシュ
pub mod password;

pub use middleware::AuthUser;
