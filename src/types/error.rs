//! Error types for the profile service
//!
//! One enum for every layer; HTTP translation lives in `status_code`.

use hyper::StatusCode;

/// Main error type for profile service operations
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not acceptable: {0}")]
    NotAcceptable(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Message broker error: {0}")]
    Broker(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Upstream answered, but with a body we cannot decode
    #[error("Invalid upstream response: {0}")]
    UpstreamInvalid(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProfileError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Broker(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) | Self::UpstreamInvalid(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether retrying the failed operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Cache(_) | Self::Broker(_) | Self::Upstream(_)
        )
    }

    /// Message shown to HTTP clients
    pub fn client_message(&self) -> String {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::NotAcceptable(m)
            | Self::PayloadTooLarge(m)
            | Self::InvalidId(m) => m.clone(),
            Self::TooManyRequests => "Too many requests".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for ProfileError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ProfileError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for ProfileError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for ProfileError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::oid::Error> for ProfileError {
    fn from(err: bson::oid::Error) -> Self {
        Self::InvalidId(err.to_string())
    }
}

impl From<bson::de::Error> for ProfileError {
    fn from(err: bson::de::Error) -> Self {
        Self::Database(format!("Document decode failed: {}", err))
    }
}

impl From<bson::ser::Error> for ProfileError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Internal(format!("Document encode failed: {}", err))
    }
}

impl From<redis::RedisError> for ProfileError {
    fn from(err: redis::RedisError) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<reqwest::Error> for ProfileError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<async_nats::Error> for ProfileError {
    fn from(err: async_nats::Error) -> Self {
        Self::Broker(err.to_string())
    }
}

/// Result type alias for profile service operations
pub type Result<T> = std::result::Result<T, ProfileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ProfileError::NotAcceptable("empty".into()).status_code(),
            StatusCode::NOT_ACCEPTABLE
        );
        assert_eq!(
            ProfileError::TooManyRequests.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ProfileError::InvalidId("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_transient_errors() {
        assert!(ProfileError::Upstream("503".into()).is_transient());
        assert!(ProfileError::Cache("down".into()).is_transient());
        assert!(!ProfileError::Forbidden("no".into()).is_transient());
        assert!(!ProfileError::NotFound("gone".into()).is_transient());
        assert!(!ProfileError::UpstreamInvalid("missing field `id`".into()).is_transient());
        assert_eq!(
            ProfileError::UpstreamInvalid("bad".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_client_message_strips_prefix() {
        let err = ProfileError::Forbidden("You are not the author of review".into());
        assert_eq!(err.client_message(), "You are not the author of review");
    }
}
