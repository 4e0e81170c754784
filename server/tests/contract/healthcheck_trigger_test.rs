//! Contract test: ヘルスチェックのトリガーと結果
//!
//! N件のサービスにN件のタスクが投入され、結果がStatusとService.upに反映される

use axum::http::{Method, StatusCode};
use control_interface::db;
use control_interface::health::UNPARSEABLE_MESSAGE;
use control_interface::tasks::Task;
use control_interface_common::config::ControlConfig;
use control_interface_common::protocol::StatusFilter;
use control_interface::hooks::{NoopHook, SharedHook};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::support::app::{
    build_app, build_app_with_config, register_service, send, test_config, wait_until, TestApp,
};
use crate::support::upstream::{healthy_service, not_found_service, slow_service};

async fn status_count(app: &TestApp) -> u64 {
    db::statuses::filter_and_paginate(&app.state.db_pool, &StatusFilter::default(), 1, 100)
        .await
        .unwrap()
        .1
}

async fn service_json(app: &TestApp, id: &str) -> Value {
    let (_, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/service/{}/", id),
        Some(&app.admin_token),
        None,
    )
    .await;
    body
}

#[tokio::test]
async fn trigger_enqueues_one_task_per_service() {
    let app = build_app().await;
    let upstream = healthy_service(json!({ "up": true, "result": { "database": "ok" } })).await;
    for name in ["A", "B", "C"] {
        register_service(&app, name, &upstream.uri()).await;
    }

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/healthcheck/trigger/",
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "healthcheck_initiated": true, "count": 3 }));

    let app = &app;
    wait_until(move || async move { status_count(app).await == 3 }).await;
    wait_until(move || async move { app.state.pool_stats.completed() == 3 }).await;
    assert_eq!(app.state.pool_stats.failed(), 0);

    let (status, health) = send(&app.router, Method::GET, "/api/health/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        health["result"]["task_queue"],
        json!({ "pending": 0, "completed": 3, "failed": 0 })
    );
}

#[tokio::test]
async fn trigger_with_no_services_reports_zero() {
    let app = build_app().await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/healthcheck/trigger/",
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn not_found_html_marks_service_down() {
    let app = build_app().await;
    let upstream = not_found_service().await;
    let id = register_service(&app, "A", &upstream.uri()).await;

    let handle = app
        .state
        .task_queue
        .submit(Task::PollService {
            service_id: Uuid::parse_str(&id).unwrap(),
        })
        .unwrap();
    let message = handle.wait().await.unwrap();
    assert_eq!(message, "Completed healthcheck for A");

    assert_eq!(service_json(&app, &id).await["up"], false);

    let (_, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/status/?service={}", id),
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["up"], false);
    assert_eq!(
        body["results"][0]["result"],
        json!({ "error": UNPARSEABLE_MESSAGE })
    );
}

#[tokio::test]
async fn healthy_response_marks_service_up() {
    let app = build_app().await;
    let upstream = healthy_service(json!({ "up": true, "result": { "database": "ok" } })).await;
    let id = register_service(&app, "A", &upstream.uri()).await;

    let handle = app
        .state
        .task_queue
        .submit(Task::PollService {
            service_id: Uuid::parse_str(&id).unwrap(),
        })
        .unwrap();
    assert_eq!(handle.wait().await.unwrap(), "Completed healthcheck for A");

    assert_eq!(service_json(&app, &id).await["up"], true);

    let (_, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/status/?service={}&up=true", id),
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["result"], json!({ "database": "ok" }));
}

#[tokio::test]
async fn reported_down_mirrors_result() {
    let app = build_app().await;
    let upstream =
        healthy_service(json!({ "up": false, "result": { "cache": "unreachable" } })).await;
    let id = register_service(&app, "A", &upstream.uri()).await;

    let handle = app
        .state
        .task_queue
        .submit(Task::PollService {
            service_id: Uuid::parse_str(&id).unwrap(),
        })
        .unwrap();
    handle.wait().await.unwrap();

    assert_eq!(service_json(&app, &id).await["up"], false);
    let (_, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/status/?service={}", id),
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(body["results"][0]["result"], json!({ "cache": "unreachable" }));
}

#[tokio::test]
async fn poll_of_missing_service_fails_without_status() {
    let app = build_app().await;

    let handle = app
        .state
        .task_queue
        .submit(Task::PollService {
            service_id: Uuid::new_v4(),
        })
        .unwrap();
    assert!(handle.wait().await.is_err());
    assert_eq!(status_count(&app).await, 0);
    assert_eq!(app.state.pool_stats.failed(), 1);
}

#[tokio::test]
async fn trigger_responds_before_checks_finish() {
    let app = build_app().await;
    let upstream = slow_service(Duration::from_millis(800)).await;
    for i in 0..6 {
        register_service(&app, &format!("S{}", i), &upstream.uri()).await;
    }

    let started = Instant::now();
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/healthcheck/trigger/",
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 6);
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(status_count(&app).await, 0);
}

#[tokio::test]
async fn trigger_larger_than_queue_is_rejected() {
    let config = ControlConfig {
        queue_capacity: 2,
        ..test_config()
    };
    let app = build_app_with_config(config, |_| -> SharedHook { Arc::new(NoopHook) }).await;
    for name in ["A", "B", "C"] {
        register_service(&app, name, "http://a.example.org").await;
    }

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/healthcheck/trigger/",
        Some(&app.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "error": "Task queue is full" }));
    assert_eq!(app.state.task_queue.pending(), 0);
}
