//! Contract test: 認証と認可
//!
//! ログイン、APIトークン必須、管理者限定ルート、自身のヘルスチェック

use axum::http::{Method, StatusCode};
use control_interface::auth::password::hash_password;
use control_interface::db;
use serde_json::json;

use crate::support::app::{build_app, send};

#[tokio::test]
async fn login_returns_token_usable_for_api() {
    let app = build_app().await;
    let hash = hash_password("password123").unwrap();
    db::users::create(&app.state.db_pool, "bob", "bob@example.org", &hash, false)
        .await
        .unwrap();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/token-auth/",
        None,
        Some(json!({ "username": "bob", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app.router, Method::GET, "/api/v1/user/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "bob");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn login_with_wrong_password_is_400() {
    let app = build_app().await;
    let hash = hash_password("password123").unwrap();
    db::users::create(&app.state.db_pool, "bob", "bob@example.org", &hash, false)
        .await
        .unwrap();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/token-auth/",
        None,
        Some(json!({ "username": "bob", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/token-auth/",
        None,
        Some(json!({ "username": "nobody", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn api_routes_require_token() {
    let app = build_app().await;

    for uri in [
        "/api/v1/service/",
        "/api/v1/status/",
        "/api/v1/userservicetoken/",
        "/api/v1/webhook/",
    ] {
        let (status, body) = send(&app.router, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} should require auth", uri);
        assert!(body["error"].is_string());

        let (status, _) = send(&app.router, Method::GET, uri, Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} should reject bad token", uri);
    }
}

#[tokio::test]
async fn bearer_scheme_is_accepted() {
    let app = build_app().await;
    let request = axum::http::Request::builder()
        .uri("/api/v1/service/")
        .header("authorization", format!("Bearer {}", app.user_token))
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let app = build_app().await;

    let (status, _) = send(&app.router, Method::GET, "/api/v1/user/", Some(&app.user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/v1/userservicetoken/trigger/",
        Some(&app.user_token),
        Some(json!({ "user_id": 1, "email": "1@example.org" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/v1/healthcheck/trigger/",
        Some(&app.user_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/v1/healthcheck/trigger/",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_can_list_users_without_hashes() {
    let app = build_app().await;

    let (status, body) = send(&app.router, Method::GET, "/api/v1/user/", Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
}

#[tokio::test]
async fn own_health_endpoint_is_public() {
    let app = build_app().await;

    let (status, body) = send(&app.router, Method::GET, "/api/health/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "up": true,
            "result": {
                "database": "Accessible",
                "task_queue": { "pending": 0, "completed": 0, "failed": 0 }
            }
        })
    );
}
