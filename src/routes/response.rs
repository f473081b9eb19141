//! JSON response and request body helpers shared by all routes

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CONTENT_TYPE,
};
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

use crate::types::{ProfileError, Result};

fn json_bytes(status: StatusCode, body: Vec<u8>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

/// Serialize `data` as the response body
pub fn json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    data: &T,
) -> Result<Response<Full<Bytes>>> {
    let body = serde_json::to_vec(data)
        .map_err(|e| ProfileError::Internal(format!("Response encode failed: {}", e)))?;
    Ok(json_bytes(status, body))
}

/// `{"message": ...}` with the error's status code
pub fn error_response(err: &ProfileError) -> Response<Full<Bytes>> {
    let status = err.status_code();
    if status.is_server_error() {
        error!(status = status.as_u16(), "Request failed: {}", err);
    } else {
        debug!(status = status.as_u16(), "Request rejected: {}", err);
    }

    let body = serde_json::to_vec(&json!({ "message": err.client_message() }))
        .unwrap_or_default();
    json_bytes(status, body)
}

pub fn not_found_response() -> Response<Full<Bytes>> {
    error_response(&ProfileError::NotFound("Not found".into()))
}

/// CORS preflight
pub fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PATCH, DELETE, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Authorization, Content-Type, X-Request-Id"),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

/// Read the request body, refusing anything over `limit` bytes
pub async fn read_body(body: Incoming, limit: usize) -> Result<Bytes> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(
            ProfileError::PayloadTooLarge(format!("Request body exceeds {} bytes", limit)),
        ),
        Err(e) => Err(ProfileError::BadRequest(format!("Failed to read body: {}", e))),
    }
}

/// Decode a JSON request body
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.is_empty() {
        return Err(ProfileError::BadRequest("Request body is required".into()));
    }
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_response_shape() {
        let response = error_response(&ProfileError::Forbidden("Not yours".into()));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body_json(response).await, json!({ "message": "Not yours" }));
    }

    #[tokio::test]
    async fn test_too_many_requests_message() {
        let response = error_response(&ProfileError::TooManyRequests);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Too many requests" })
        );
    }

    #[test]
    fn test_parse_json_requires_body() {
        let err = parse_json::<serde_json::Value>(b"").unwrap_err();
        assert!(matches!(err, ProfileError::BadRequest(_)));

        let err = parse_json::<serde_json::Value>(b"{not json").unwrap_err();
        assert!(matches!(err, ProfileError::BadRequest(_)));
    }

    #[test]
    fn test_preflight_allows_request_id() {
        let response = preflight_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let allowed = response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_HEADERS)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(allowed.contains("X-Request-Id"));
    }
}
