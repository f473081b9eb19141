//! Caller authentication
//!
//! With auth enabled, the bearer token is forwarded to the auth service,
//! which answers with the current user. Transport errors and 5xx answers
//! run under the retry policy. Otherwise every request acts as a fixed
//! development user.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

use crate::models::User;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::{ProfileError, Result};

/// Resolves the caller of a request
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// `authorization` is the raw `Authorization` header, if any
    async fn authenticate(&self, authorization: Option<&str>) -> Result<User>;
}

/// Extract the token from a `Bearer <token>` header value
pub fn extract_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Validates tokens against the auth service's current-user endpoint
pub struct AuthApi {
    url: String,
    http_client: reqwest::Client,
    retry: RetryPolicy,
}

impl AuthApi {
    pub fn new(url: impl Into<String>, request_timeout: Duration, retry: RetryPolicy) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("ugc-profile/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            url: url.into(),
            http_client,
            retry,
        }
    }

    async fn current_user(&self, token: &str) -> Result<User> {
        let response = self
            .http_client
            .get(&self.url)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => response.json::<User>().await.map_err(|e| {
                ProfileError::UpstreamInvalid(format!("Invalid auth service response: {}", e))
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ProfileError::Unauthorized("Invalid or expired token".into()))
            }
            status if status.is_server_error() => Err(ProfileError::Upstream(format!(
                "Auth service returned {}",
                status
            ))),
            status => Err(ProfileError::UpstreamInvalid(format!(
                "Auth service returned {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl Authenticator for AuthApi {
    async fn authenticate(&self, authorization: Option<&str>) -> Result<User> {
        let token = authorization
            .and_then(extract_bearer)
            .ok_or_else(|| ProfileError::Unauthorized("Missing bearer token".into()))?;

        let user = retry_with_backoff(&self.retry, "auth_api.current_user", || {
            self.current_user(token)
        })
        .await?;
        debug!(user_id = %user.id, "Authenticated");
        Ok(user)
    }
}

/// Treats every caller as one configured user
#[derive(Debug, Clone)]
pub struct DevAuthenticator {
    user: User,
}

impl DevAuthenticator {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user: User::with_id(user_id),
        }
    }
}

#[async_trait]
impl Authenticator for DevAuthenticator {
    async fn authenticate(&self, _authorization: Option<&str>) -> Result<User> {
        Ok(self.user.clone())
    }
}
