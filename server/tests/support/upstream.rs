use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// `/api/health` が指定のJSONを返す監視対象サービス
#[allow(dead_code)]
pub async fn healthy_service(body: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .and(header("authorization", "Token service-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

/// `/api/health` が404のHTMLを返す監視対象サービス
#[allow(dead_code)]
pub async fn not_found_service() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("content-type", "text/html")
                .set_body_string("<html><body>Not Found</body></html>"),
        )
        .mount(&server)
        .await;
    server
}

/// ユーザートークンを発行する監視対象サービス
#[allow(dead_code)]
pub async fn token_issuing_service(token: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/user/token/"))
        .and(header("authorization", "Token service-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
        .mount(&server)
        .await;
    server
}

/// 応答が `delay` だけ遅れる監視対象サービス
#[allow(dead_code)]
pub async fn slow_service(delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "up": true, "result": {} }))
                .set_delay(delay),
        )
        .mount(&server)
        .await;
    server
}
