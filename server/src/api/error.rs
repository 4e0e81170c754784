//! APIエラーレスポンス型
//!
//! axum用の共通エラーハンドリング

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use control_interface_common::error::{CommonError, ControlError};
use serde::de::DeserializeOwned;
use serde_json::json;

/// Axum用のエラーレスポンス型
#[derive(Debug)]
pub struct AppError(pub ControlError);

impl From<ControlError> for AppError {
    fn from(err: ControlError) -> Self {
        AppError(err)
    }
}

impl From<CommonError> for AppError {
    fn from(err: CommonError) -> Self {
        AppError(ControlError::Common(err))
    }
}

impl AppError {
    /// HTTPステータスコード
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            ControlError::Common(_) => StatusCode::BAD_REQUEST,
            ControlError::ServiceNotFound(_) | ControlError::NotFound(_) => StatusCode::NOT_FOUND,
            ControlError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ControlError::Http(_) => StatusCode::BAD_GATEWAY,
            ControlError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ControlError::QueueClosed | ControlError::QueueFull(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ControlError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ControlError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ControlError::Authorization(_) => StatusCode::FORBIDDEN,
            ControlError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ControlError::Conflict(_) => StatusCode::CONFLICT,
            ControlError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        // 詳細はログのみに出し、クライアントには external_message() を返す
        if status.is_server_error() {
            tracing::error!(status = %status, "Request failed: {}", self.0);
        } else {
            tracing::debug!(status = %status, "Request rejected: {}", self.0);
        }

        let payload = json!({
            "error": self.0.external_message()
        });

        (status, Json(payload)).into_response()
    }
}

/// JSONボディ抽出器
///
/// axumの `Json` は形式不一致を422で返すが、本APIでは400に揃える。
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    CommonError::Validation(rejection.body_text()).into()
}
