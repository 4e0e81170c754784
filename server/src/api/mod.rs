//! REST APIハンドラー
//!
//! サービス登録、ステータス参照、ユーザートークン、Webhook、認証API

pub mod auth;
pub mod error;
pub mod healthcheck;
pub mod hooks;
pub mod pagination;
pub mod services;
pub mod statuses;
pub mod user_service_tokens;

use crate::auth::middleware::{require_admin_middleware, token_auth_middleware};
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// APIルーターを作成
///
/// - `/api/health/` と `/api/token-auth/` は認証不要
/// - `/api/v1/*` はAPIトークン必須、トリガーとユーザー一覧は管理者限定
pub fn create_app(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/v1/user/", get(auth::list_users))
        .route(
            "/api/v1/userservicetoken/trigger/",
            post(user_service_tokens::trigger_user_tokens),
        )
        .route(
            "/api/v1/healthcheck/trigger/",
            post(healthcheck::trigger_health_checks),
        )
        .route_layer(middleware::from_fn(require_admin_middleware));

    let authenticated_routes = Router::new()
        .route(
            "/api/v1/service/",
            get(services::list_services).post(services::create_service),
        )
        .route(
            "/api/v1/service/:id/",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .route(
            "/api/v1/status/",
            get(statuses::list_statuses).post(statuses::method_not_allowed),
        )
        .route("/api/v1/status/:id/", get(statuses::get_status))
        .route(
            "/api/v1/userservicetoken/",
            get(user_service_tokens::list_tokens),
        )
        .route(
            "/api/v1/userservicetoken/:id/",
            get(user_service_tokens::get_token),
        )
        .route(
            "/api/v1/webhook/",
            get(hooks::list_hooks).post(hooks::create_hook),
        )
        .route(
            "/api/v1/webhook/:id/",
            get(hooks::get_hook).delete(hooks::delete_hook),
        )
        .route("/api/v1/user/me/", get(auth::me))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            token_auth_middleware,
        ));

    Router::new()
        .route("/api/health/", get(healthcheck::health))
        .route("/api/token-auth/", post(auth::login))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
