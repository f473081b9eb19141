//! Request gating through the real hyper connection path

mod common;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;

use common::Fixture;
use ugc_profile::server::{handle_request, REQUEST_ID_HEADER};

/// Serve `handle_request` on an ephemeral port and return the base URL
async fn spawn_server(flags: &[&str]) -> String {
    let state = Arc::new(Fixture::with_flags(flags).state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        while let Ok((stream, addr)) = listener.accept().await {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let service = service_fn(move |req| handle_request(Arc::clone(&state), addr, req));
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    base
}

#[tokio::test]
async fn test_health_reports_fallbacks() {
    let base = spawn_server(&[]).await;

    let response = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["healthy"], true);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["cache"]["backend"], "memory");
    assert_eq!(body["rate_limit"]["capacity"], 10);
}

#[tokio::test]
async fn test_production_mode_requires_request_id() {
    let base = spawn_server(&["--production-mode"]).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!("{}/health", base))
        .header("X-Request-Id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");
}

#[tokio::test]
async fn test_token_bucket_rejects_burst() {
    let base = spawn_server(&["--token-bucket-capacity", "2", "--token-bucket-rate", "0.001"]).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let response = client.get(format!("{}/health", base)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Too many requests");
}

#[tokio::test]
async fn test_preflight_skips_rate_limit() {
    let base = spawn_server(&["--token-bucket-capacity", "1", "--token-bucket-rate", "0.001"]).await;
    let client = reqwest::Client::new();

    for _ in 0..3 {
        let response = client
            .request(reqwest::Method::OPTIONS, format!("{}/api/v1/profile", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
async fn test_api_requires_auth() {
    let base = spawn_server(&[]).await;

    let response = reqwest::get(format!("{}/api/v1/profile", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = reqwest::Client::new()
        .get(format!("{}/api/v1/profile", base))
        .bearer_auth("alice")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user_id"], "alice");
}

#[tokio::test]
async fn test_oversized_body_is_refused() {
    let base = spawn_server(&["--max-body-bytes", "64"]).await;
    let client = reqwest::Client::new();
    let review = format!("{{\"review\": \"{}\"}}", "x".repeat(4096));

    let response = client
        .post(format!("{}/api/v1/review/m1", base))
        .bearer_auth("alice")
        .header("Content-Type", "application/json")
        .body(review.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Request body exceeds 64 bytes");

    let response = client
        .post(format!("{}/api/v1/review/m1", base))
        .bearer_auth("alice")
        .json(&serde_json::json!({ "review": "Short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_unauthenticated_body_is_never_read() {
    let base = spawn_server(&["--max-body-bytes", "64"]).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/review/m1", base))
        .body("x".repeat(4096))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
