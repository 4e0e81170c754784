//! Contract test: サービス登録API
//!
//! 登録時は常に `up == false`、CRUDと入力検証

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::support::app::{build_app, register_service, send};

#[tokio::test]
async fn registration_always_starts_down() {
    let app = build_app().await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/service/",
        Some(&app.user_token),
        Some(json!({
            "name": "A",
            "url": "http://a.example.org",
            "token": "service-token",
            "up": true
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "A");
    assert_eq!(body["up"], false);
    assert!(body["created_by"].is_string());
    assert_eq!(body["created_by"], body["updated_by"]);
}

#[tokio::test]
async fn registration_validates_input() {
    let app = build_app().await;

    for payload in [
        json!({ "name": "", "url": "http://a.example.org", "token": "t" }),
        json!({ "name": "A", "url": "not a url", "token": "t" }),
        json!({ "name": "A", "url": "http://exa mple.org", "token": "t" }),
        json!({ "name": "A", "url": "http://:::", "token": "t" }),
        json!({ "name": "A", "url": "https://%%%", "token": "t" }),
        json!({ "name": "A", "url": "http://a.example.org", "token": "" }),
        json!({ "name": "A" }),
    ] {
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/v1/service/",
            Some(&app.user_token),
            Some(payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {}", payload);
        assert!(body["error"].is_string());
    }

    let (_, body) = send(&app.router, Method::GET, "/api/v1/service/", Some(&app.user_token), None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn service_crud_round() {
    let app = build_app().await;
    let id = register_service(&app, "A", "http://a.example.org").await;
    let uri = format!("/api/v1/service/{}/", id);

    let (status, body) = send(&app.router, Method::GET, &uri, Some(&app.user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "http://a.example.org");

    let (status, body) = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(&app.admin_token),
        Some(json!({ "name": "A2", "url": "https://a2.example.org", "token": "t2", "up": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "A2");
    assert_eq!(body["up"], false);
    assert_ne!(body["created_by"], body["updated_by"]);

    let (status, _) = send(&app.router, Method::DELETE, &uri, Some(&app.user_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app.router, Method::GET, &uri, Some(&app.user_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Service not found");

    let (status, _) = send(&app.router, Method::DELETE, &uri, Some(&app.user_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn service_list_is_paginated_in_registration_order() {
    let app = build_app().await;
    // page_size = 5
    for i in 0..7 {
        register_service(&app, &format!("svc-{}", i), "http://svc.example.org").await;
    }

    let (status, body) = send(&app.router, Method::GET, "/api/v1/service/", Some(&app.user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 7);
    assert_eq!(body["next"], 2);
    assert!(body["previous"].is_null());
    let names: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["svc-0", "svc-1", "svc-2", "svc-3", "svc-4"]);

    let (status, body) = send(&app.router, Method::GET, "/api/v1/service/?page=2", Some(&app.user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert!(body["next"].is_null());
    assert_eq!(body["previous"], 1);

    let (status, _) = send(&app.router, Method::GET, "/api/v1/service/?page=3", Some(&app.user_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
