//! Contract test: ユーザーサービストークンの一括発行
//!
//! 管理者がトリガーすると、サービス毎にトークン発行タスクが投入される

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::support::app::{build_app, register_service, send, wait_until, TestApp};
use crate::support::upstream::token_issuing_service;

async fn token_list(app: &TestApp, query: &str) -> Value {
    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/userservicetoken/{}", query),
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn trigger_issues_token_for_every_service() {
    let app = build_app().await;
    let upstream = token_issuing_service("issued-token").await;
    let a = register_service(&app, "A", &upstream.uri()).await;
    register_service(&app, "B", &upstream.uri()).await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/userservicetoken/trigger/",
        Some(&app.admin_token),
        Some(json!({ "user_id": 1, "email": "1@example.org" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({ "user_service_token_initiated": true, "count": 2 })
    );

    let app = &app;
    wait_until(move || async move { token_list(app, "").await["count"] == 2 }).await;

    let body = token_list(app, &format!("?service={}", a)).await;
    assert_eq!(body["count"], 1);
    let token = &body["results"][0];
    assert_eq!(token["user_id"], 1);
    assert_eq!(token["email"], "1@example.org");
    assert_eq!(token["token"], "issued-token");

    let (status, detail) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/userservicetoken/{}/", token["id"].as_str().unwrap()),
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&detail, token);

    assert_eq!(token_list(app, "?user_id=2").await["count"], 0);
    assert_eq!(token_list(app, "?email=1@example.org").await["count"], 2);
}

#[tokio::test]
async fn malformed_trigger_body_is_400() {
    let app = build_app().await;
    register_service(&app, "A", "http://a.example.org").await;

    for payload in [
        json!({ "user_id": -1, "email": "1@example.org" }),
        json!({ "user_id": "one", "email": "1@example.org" }),
        json!({ "email": "1@example.org" }),
        json!({ "user_id": 1, "email": "" }),
    ] {
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/v1/userservicetoken/trigger/",
            Some(&app.admin_token),
            Some(payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {}", payload);
        assert!(body["error"].is_string());
    }

    assert_eq!(app.state.pool_stats.completed(), 0);
    assert_eq!(app.state.pool_stats.failed(), 0);
}

#[tokio::test]
async fn token_list_rejects_invalid_user_id_filter() {
    let app = build_app().await;

    let (status, _) = send(
        &app.router,
        Method::GET,
        "/api/v1/userservicetoken/?user_id=abc",
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
