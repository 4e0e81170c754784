use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use control_interface::hooks::{NoopHook, SharedHook, WebhookDispatcher};
use control_interface::{api, db, shutdown::ShutdownController, AppState};
use control_interface_common::config::ControlConfig;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// テスト用アプリケーション
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub admin_token: String,
    pub user_token: String,
}

#[allow(dead_code)]
pub fn test_config() -> ControlConfig {
    ControlConfig {
        database_url: "sqlite::memory:".to_string(),
        poll_interval_secs: 0,
        health_check_timeout_secs: 2,
        webhook_timeout_secs: 2,
        page_size: 5,
        ..ControlConfig::default()
    }
}

#[allow(dead_code)]
pub async fn build_app() -> TestApp {
    build_app_with_hook(|_| -> SharedHook { Arc::new(NoopHook) }).await
}

/// Webhookを実際に配信するアプリ
#[allow(dead_code)]
pub async fn build_app_with_webhooks() -> TestApp {
    build_app_with_hook(|pool| -> SharedHook {
        Arc::new(WebhookDispatcher::new(pool, Duration::from_secs(2)))
    })
    .await
}

#[allow(dead_code)]
pub async fn build_app_with_hook<F>(make_hook: F) -> TestApp
where
    F: FnOnce(sqlx::SqlitePool) -> SharedHook,
{
    build_app_with_config(test_config(), make_hook).await
}

#[allow(dead_code)]
pub async fn build_app_with_config<F>(config: ControlConfig, make_hook: F) -> TestApp
where
    F: FnOnce(sqlx::SqlitePool) -> SharedHook,
{
    let db_pool = db::migrations::initialize_database(&config.database_url)
        .await
        .expect("Failed to create test database");
    let hook = make_hook(db_pool.clone());

    let admin_token = create_user_with_token(&db_pool, "admin", true).await;
    let user_token = create_user_with_token(&db_pool, "alice", false).await;

    // ワーカープールはバックグラウンドで動き続ける
    let (state, _workers) =
        AppState::build(db_pool, config, hook, ShutdownController::default());

    TestApp {
        router: api::create_app(state.clone()),
        state,
        admin_token,
        user_token,
    }
}

/// ユーザーを作成してAPIトークンを返す（パスワードでのログインは不要な場合）
#[allow(dead_code)]
pub async fn create_user_with_token(
    pool: &sqlx::SqlitePool,
    username: &str,
    is_admin: bool,
) -> String {
    let user = db::users::create(
        pool,
        username,
        &format!("{}@example.org", username),
        "not-a-bcrypt-hash",
        is_admin,
    )
    .await
    .expect("create user");
    db::api_tokens::issue(pool, user.id)
        .await
        .expect("issue api token")
}

/// リクエストを送ってステータスとJSONボディを返す
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Token {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// 条件が満たされるまで待つ（非同期タスクの完了待ち）
#[allow(dead_code)]
pub async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition was not met within 5 seconds");
}

/// サービスを登録してIDを返す
#[allow(dead_code)]
pub async fn register_service(app: &TestApp, name: &str, url: &str) -> String {
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/service/",
        Some(&app.user_token),
        Some(serde_json::json!({ "name": name, "url": url, "token": "service-token" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}
