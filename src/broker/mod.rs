//! Event publishing
//!
//! Handlers publish through `MessageBroker`. `NatsMessageBroker` sends each
//! event to `{subject}.{key}` with the key in a `Ugc-Key` header;
//! `LoggingBroker` stands in when NATS is unavailable in dev mode.

use async_nats::{HeaderMap, HeaderValue};
use async_trait::async_trait;
use bytes::Bytes;
use std::str::FromStr;
use tracing::{debug, info};

use crate::nats::NatsClient;
use crate::types::{ProfileError, Result};

/// Header carrying the unmodified event key
pub const KEY_HEADER: &str = "Ugc-Key";

/// Producer side of the event bus
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publish one JSON event under `key`
    async fn send(&self, key: &str, event: serde_json::Value) -> Result<()>;

    /// Subject tree this broker publishes into
    fn subject(&self) -> &str;
}

/// Serialize and publish an event
pub async fn publish<T: serde::Serialize + ?Sized>(
    broker: &dyn MessageBroker,
    key: &str,
    event: &T,
) -> Result<()> {
    let value = serde_json::to_value(event)
        .map_err(|e| ProfileError::Internal(format!("Event encode failed: {}", e)))?;
    broker.send(key, value).await
}

/// Turn an event key into a single subject token
pub fn subject_token(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '.' | '*' | '>' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

/// Publishes to NATS core subjects
#[derive(Clone)]
pub struct NatsMessageBroker {
    client: NatsClient,
    subject: String,
}

impl NatsMessageBroker {
    pub fn new(client: NatsClient, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
        }
    }

    fn subject_for(&self, key: &str) -> String {
        format!("{}.{}", self.subject, subject_token(key))
    }
}

#[async_trait]
impl MessageBroker for NatsMessageBroker {
    async fn send(&self, key: &str, event: serde_json::Value) -> Result<()> {
        let subject = self.subject_for(key);
        let payload = serde_json::to_vec(&event)
            .map(Bytes::from)
            .map_err(|e| ProfileError::Internal(format!("Event encode failed: {}", e)))?;

        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(key)
            .map_err(|e| ProfileError::Broker(format!("Invalid event key {}: {}", key, e)))?;
        headers.insert(KEY_HEADER, value);

        self.client
            .publish_with_headers(&subject, headers, payload)
            .await?;

        debug!(subject = %subject, key = key, "Event published");
        Ok(())
    }

    fn subject(&self) -> &str {
        &self.subject
    }
}

/// Logs events instead of publishing them
#[derive(Debug, Clone)]
pub struct LoggingBroker {
    subject: String,
}

impl LoggingBroker {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

#[async_trait]
impl MessageBroker for LoggingBroker {
    async fn send(&self, key: &str, event: serde_json::Value) -> Result<()> {
        info!(subject = %self.subject, key = key, event = %event, "Event (not published)");
        Ok(())
    }

    fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UgcEvent;

    #[test]
    fn test_subject_token() {
        assert_eq!(subject_token("review-like"), "review-like");
        assert_eq!(subject_token("m1+u1"), "m1+u1");
        assert_eq!(subject_token("a.b c*>"), "a_b_c__");
    }

    #[tokio::test]
    async fn test_logging_broker_accepts_events() {
        let broker = LoggingBroker::new("ugc");
        publish(&broker, "bookmark", &UgcEvent::new("u1", "m1", true))
            .await
            .unwrap();
        assert_eq!(broker.subject(), "ugc");
    }
}
