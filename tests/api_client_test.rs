mod helpers;

use helpers::*;
use serde_json::{json, Value};
use std::time::Duration;
use wintrust_client::api::Method;
use wintrust_client::{ApiClient, AppError, RetryPolicy};

/// Three 503s then a 200: the retries absorb the outage
#[tokio::test]
async fn test_retries_server_errors_until_success() {
    let backend = MockBackend::scripted(vec![
        Reply::json(503, json!({ "error": "unavailable" })),
        Reply::json(503, json!({ "error": "unavailable" })),
        Reply::json(503, json!({ "error": "unavailable" })),
        Reply::json(200, json!([{ "ok": true }])),
    ])
    .await;

    let client = test_client(&backend.url);
    let response = client.get::<Value>("/sorteos").await;

    assert_eq!(response.status, 200);
    assert_eq!(response.data(), Some(&json!([{ "ok": true }])));
    assert_eq!(backend.request_count(), 4);
}

/// A fourth consecutive 503 exhausts the retries and surfaces a server error
#[tokio::test]
async fn test_retry_exhaustion_returns_server_error() {
    let backend = MockBackend::scripted(vec![Reply::json(503, json!({ "error": "mantenimiento" }))]).await;

    let client = test_client(&backend.url);
    let response = client.get::<Value>("/sorteos").await;

    assert_eq!(response.status, 503);
    match response.error() {
        Some(AppError::Server { status, message }) => {
            assert_eq!(*status, 503);
            assert_eq!(message, "mantenimiento");
        }
        other => panic!("expected server error, got {:?}", other),
    }
    assert_eq!(backend.request_count(), 4);
}

#[tokio::test]
async fn test_request_timeout_is_retried() {
    let backend = MockBackend::start(|_, index| {
        let reply = Reply::json(200, json!({ "id": "r1" }));
        if index == 0 {
            reply.delayed(Duration::from_millis(400))
        } else {
            reply
        }
    })
    .await;

    let client = ApiClient::with_policy(&backend.url, Duration::from_millis(100), fast_retry());
    let response = client.get::<Value>("/sorteos/r1").await;

    assert!(response.is_success());
    assert_eq!(backend.request_count(), 2);
}

#[tokio::test]
async fn test_request_timeout_status_is_408() {
    let backend = MockBackend::scripted(vec![
        Reply::json(200, json!({})).delayed(Duration::from_millis(300)),
    ])
    .await;

    let client = ApiClient::with_policy(&backend.url, Duration::from_millis(50), RetryPolicy::none());
    let response = client.get::<Value>("/sorteos").await;

    assert_eq!(response.status, 408);
    assert!(matches!(response.error(), Some(AppError::Timeout(50))));
}

#[tokio::test]
async fn test_request_timeout_408_response_is_retried() {
    let backend = MockBackend::scripted(vec![
        Reply::json(408, json!({ "error": "slow" })),
        Reply::json(200, json!({ "ok": true })),
    ])
    .await;

    let response = test_client(&backend.url).get::<Value>("/sorteos").await;
    assert!(response.is_success());
    assert_eq!(backend.request_count(), 2);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let backend = MockBackend::scripted(vec![Reply::json(404, json!({ "error": "Sorteo no encontrado" }))]).await;

    let client = test_client(&backend.url);
    let response = client.get::<Value>("/sorteos/missing").await;

    assert_eq!(response.status, 404);
    assert_eq!(response.error_message().as_deref(), Some("Sorteo no encontrado"));
    assert!(response.error().map(AppError::is_not_found).unwrap_or(false));
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn test_malformed_success_body_maps_to_unknown_error() {
    let backend = MockBackend::scripted(vec![Reply::raw(200, "<html>oops</html>")]).await;

    let client = test_client(&backend.url);
    let response = client.get::<Value>("/sorteos").await;

    assert!(!response.is_success());
    assert_eq!(response.error_message().as_deref(), Some("Unknown error"));
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Reserve a port, then free it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let policy = RetryPolicy {
        max_retries: 1,
        base_delay: Duration::from_millis(5),
        multiplier: 2,
    };
    let client = ApiClient::with_policy(&format!("http://{}", addr), Duration::from_millis(500), policy);
    let response = client.get::<Value>("/sorteos").await;

    assert!(matches!(response.error(), Some(AppError::Network(_))));
    assert_eq!(response.status, 500);
}

#[tokio::test]
async fn test_headers_and_bodies() {
    let backend = MockBackend::scripted(vec![Reply::json(200, json!({ "ok": true }))]).await;
    let client = test_client(&backend.url);
    client.set_auth_token("session-123").await;

    let get = client.get::<Value>("/sorteos").await;
    assert!(get.is_success());

    let post = client
        .post::<Value, _>("/sorteos/participar", &json!({ "raffleId": "r1" }))
        .await;
    assert!(post.is_success());

    client.clear_auth_token().await;
    let anonymous = client.request::<Value>("/sorteos", Method::GET, Some(json!({ "ignored": true }))).await;
    assert!(anonymous.is_success());

    let requests = backend.requests();
    assert_eq!(requests.len(), 3);

    let first = &requests[0];
    assert_eq!(first.method, "GET");
    assert_eq!(first.path, "/sorteos");
    assert_eq!(first.header("authorization"), Some("Bearer session-123"));
    assert_eq!(first.header("cache-control"), Some("no-cache, no-store, must-revalidate"));
    assert_eq!(first.header("pragma"), Some("no-cache"));
    assert_eq!(first.header("content-type"), Some("application/json"));
    assert!(first.header("x-request-id").is_some());
    assert!(first.body.is_empty());

    let second = &requests[1];
    assert_eq!(second.method, "POST");
    assert_eq!(second.json(), json!({ "raffleId": "r1" }));

    let third = &requests[2];
    assert!(third.header("authorization").is_none());
    assert!(third.body.is_empty());
}

#[tokio::test]
async fn test_request_once_does_not_retry() {
    let backend = MockBackend::scripted(vec![Reply::json(500, json!({ "error": "boom" }))]).await;
    let client = test_client(&backend.url);

    let response = client.request_once::<Value>("/sorteos", Method::GET, None).await;
    assert_eq!(response.status, 500);
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn test_empty_success_body() {
    let backend = MockBackend::scripted(vec![Reply::raw(200, "")]).await;
    let client = test_client(&backend.url);

    let response = client.delete::<()>("/sorteos/r1").await;
    assert!(response.is_success());
}

#[tokio::test]
async fn test_health_check() {
    let up = MockBackend::scripted(vec![Reply::json(200, json!({ "nonce": "abc" }))]).await;
    assert!(test_client(&up.url).health_check().await);
    assert_eq!(up.requests()[0].path, "/api/nonce");

    let down = MockBackend::scripted(vec![Reply::json(500, json!({}))]).await;
    assert!(!test_client(&down.url).health_check().await);
}
