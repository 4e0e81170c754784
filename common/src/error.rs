//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! `ControlError::external_message()` はクライアントに返してよいメッセージのみを返す。
//! 詳細（`Display`）はサーバーログ専用。

use thiserror::Error;
use uuid::Uuid;

/// Common layer error type
#[derive(Debug, Error)]
pub enum CommonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// UUID parse error
    #[error("UUID parse error: {0}")]
    UuidParse(#[from] uuid::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<config::ConfigError> for CommonError {
    fn from(err: config::ConfigError) -> Self {
        CommonError::Config(err.to_string())
    }
}

/// Control interface error type
#[derive(Debug, Error)]
pub enum ControlError {
    /// Common layer error
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Service not found
    #[error("Service not found: {0}")]
    ServiceNotFound(Uuid),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Http(String),

    /// Timeout error
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Task queue is closed (shutting down)
    #[error("Task queue closed")]
    QueueClosed,

    /// Task queue has no room for the whole batch
    #[error("Task queue full: {0}")]
    QueueFull(String),

    /// Password hash error
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Authorization error
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Invalid credentials on login
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Conflict error (e.g., duplicate resource)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ControlError {
    /// Returns a safe error message for external clients.
    pub fn external_message(&self) -> String {
        match self {
            // 入力エラーは内容を返してよい
            Self::Common(CommonError::Validation(msg)) => msg.clone(),
            Self::Common(_) => "Request error".to_string(),
            Self::ServiceNotFound(_) => "Service not found".to_string(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::Database(_) => "Database error".to_string(),
            Self::Http(_) => "Upstream service unavailable".to_string(),
            Self::Timeout(_) => "Upstream request timeout".to_string(),
            Self::QueueClosed => "Task queue unavailable".to_string(),
            Self::QueueFull(_) => "Task queue is full".to_string(),
            Self::PasswordHash(_) => "Authentication error".to_string(),
            Self::Authentication(_) => {
                "Authentication credentials were not provided or are invalid".to_string()
            }
            Self::Authorization(_) => {
                "You do not have permission to perform this action".to_string()
            }
            Self::InvalidCredentials => {
                "Unable to log in with provided credentials".to_string()
            }
            Self::Conflict(_) => "Resource conflict".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

/// Result alias for the control interface
pub type ControlResult<T> = Result<T, ControlError>;
