//! Contract test: ステータス参照API
//!
//! フィルタ（service, up）、並び順、ページング、POSTの拒否

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use control_interface::db;
use control_interface_common::types::Status;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::support::app::{build_app, register_service, send, TestApp};

async fn record(app: &TestApp, service: &str, up: bool, seconds_ago: i64) -> Uuid {
    let mut result = Map::new();
    result.insert("database".to_string(), Value::from(if up { "ok" } else { "down" }));
    let status = Status {
        id: Uuid::new_v4(),
        service: Uuid::parse_str(service).unwrap(),
        up,
        result,
        created_by: None,
        updated_by: None,
        created_at: Utc::now() - Duration::seconds(seconds_ago),
    };
    db::statuses::record_poll_outcome(&app.state.db_pool, &status)
        .await
        .unwrap();
    status.id
}

fn ids(body: &Value) -> Vec<String> {
    body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn status_creation_is_not_allowed() {
    let app = build_app().await;
    let service = register_service(&app, "A", "http://a.example.org").await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/status/",
        Some(&app.admin_token),
        Some(json!({ "service": service, "up": true, "result": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method \"POST\" not allowed.");

    let (_, body) = send(&app.router, Method::GET, "/api/v1/status/", Some(&app.admin_token), None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn statuses_filter_by_service_and_up() {
    let app = build_app().await;
    let a = register_service(&app, "A", "http://a.example.org").await;
    let b = register_service(&app, "B", "http://b.example.org").await;

    let a_up = record(&app, &a, true, 30).await;
    let a_down = record(&app, &a, false, 20).await;
    let b_down = record(&app, &b, false, 10).await;

    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/status/?service={}", a),
        Some(&app.user_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(ids(&body), vec![a_up.to_string(), a_down.to_string()]);

    let (_, body) = send(&app.router, Method::GET, "/api/v1/status/?up=False", Some(&app.user_token), None).await;
    assert_eq!(ids(&body), vec![a_down.to_string(), b_down.to_string()]);

    let (_, body) = send(&app.router, Method::GET, "/api/v1/status/?up=1", Some(&app.user_token), None).await;
    assert_eq!(ids(&body), vec![a_up.to_string()]);
    assert_eq!(body["results"][0]["result"], json!({ "database": "ok" }));

    let (_, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/status/?service={}&up=true", b),
        Some(&app.user_token),
        None,
    )
    .await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn statuses_ordering() {
    let app = build_app().await;
    let a = register_service(&app, "A", "http://a.example.org").await;

    let oldest = record(&app, &a, true, 30).await;
    let middle = record(&app, &a, false, 20).await;
    let newest = record(&app, &a, true, 10).await;

    let (_, body) = send(&app.router, Method::GET, "/api/v1/status/", Some(&app.user_token), None).await;
    assert_eq!(
        ids(&body),
        vec![oldest.to_string(), middle.to_string(), newest.to_string()]
    );

    let (_, body) = send(
        &app.router,
        Method::GET,
        "/api/v1/status/?ordering=-created_at",
        Some(&app.user_token),
        None,
    )
    .await;
    assert_eq!(
        ids(&body),
        vec![newest.to_string(), middle.to_string(), oldest.to_string()]
    );

    let (status, _) = send(
        &app.router,
        Method::GET,
        "/api/v1/status/?ordering=up",
        Some(&app.user_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn statuses_invalid_filters_are_400() {
    let app = build_app().await;

    let (status, _) = send(&app.router, Method::GET, "/api/v1/status/?service=xyz", Some(&app.user_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app.router, Method::GET, "/api/v1/status/?up=maybe", Some(&app.user_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_detail() {
    let app = build_app().await;
    let a = register_service(&app, "A", "http://a.example.org").await;
    let id = record(&app, &a, true, 0).await;

    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/status/{}/", id),
        Some(&app.user_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], a.as_str());
    assert_eq!(body["up"], true);

    let (status, _) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/status/{}/", Uuid::new_v4()),
        Some(&app.user_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
