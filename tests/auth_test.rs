//! Auth service client against a local stub of the users/me endpoint

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::AUTHORIZATION;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use ugc_profile::auth::{AuthApi, Authenticator};
use ugc_profile::retry::RetryPolicy;
use ugc_profile::ProfileError;

fn respond(authorization: &str) -> Response<Full<Bytes>> {
    let (status, body) = match authorization {
        "Bearer good" => (
            StatusCode::OK,
            json!({ "id": "u1", "username": "ada", "first_name": "Ada" }),
        ),
        "Bearer flaky" => (StatusCode::SERVICE_UNAVAILABLE, json!({})),
        "Bearer garbled" => (StatusCode::OK, json!({ "username": "no id" })),
        "Bearer teapot" => (StatusCode::IM_A_TEAPOT, json!({})),
        _ => (StatusCode::UNAUTHORIZED, json!({ "detail": "expired" })),
    };

    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
}

async fn serve(hits: Arc<AtomicUsize>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let hits = Arc::clone(&hits);
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let authorization = req
                        .headers()
                        .get(AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("");
                    let response = respond(authorization);
                    async move { Ok::<_, Infallible>(response) }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    format!("http://{}/api/v1/users/me", addr)
}

async fn client(retries: usize) -> (AuthApi, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let url = serve(Arc::clone(&hits)).await;
    let api = AuthApi::new(
        url,
        Duration::from_secs(2),
        RetryPolicy::new(retries, Duration::ZERO, Duration::ZERO, 2.0),
    );
    (api, hits)
}

#[tokio::test]
async fn test_valid_token_resolves_user() {
    let (api, hits) = client(3).await;

    let user = api.authenticate(Some("Bearer good")).await.unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.username.as_deref(), Some("ada"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rejected_token_is_not_retried() {
    let (api, hits) = client(3).await;

    let err = api.authenticate(Some("Bearer expired")).await.unwrap_err();
    assert!(matches!(err, ProfileError::Unauthorized(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let (api, hits) = client(2).await;

    let err = api.authenticate(Some("Bearer flaky")).await.unwrap_err();
    assert!(matches!(err, ProfileError::Upstream(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_deterministic_failures_fail_fast() {
    let (api, hits) = client(3).await;

    let err = api.authenticate(Some("Bearer garbled")).await.unwrap_err();
    assert!(matches!(err, ProfileError::UpstreamInvalid(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let err = api.authenticate(Some("Bearer teapot")).await.unwrap_err();
    assert!(matches!(err, ProfileError::UpstreamInvalid(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_missing_token_skips_the_request() {
    let (api, hits) = client(3).await;

    let err = api.authenticate(None).await.unwrap_err();
    assert!(matches!(err, ProfileError::Unauthorized(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
