//! NATS client wrapper
//!
//! Connection management plus the JetStream setup for the event subjects.

use async_nats::jetstream::{self, stream::StorageType};
use async_nats::{Client, ConnectOptions, HeaderMap};
use bytes::Bytes;
use std::time::Duration;
use tracing::info;

use crate::config::NatsArgs;
use crate::types::{ProfileError, Result};

/// Default ping interval for keep-alive
const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(120);

/// Events stay in the streams for a week
const STREAM_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// NATS client wrapper
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect, failing fast if the server is unreachable
    pub async fn new(args: &NatsArgs, name: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", args.nats_url);

        let mut options = ConnectOptions::new()
            .name(name)
            .ping_interval(DEFAULT_PING_INTERVAL)
            .connection_timeout(Duration::from_secs(5));

        if let (Some(user), Some(pass)) = (&args.nats_user, &args.nats_password) {
            options = options.user_and_password(user.clone(), pass.clone());
        }

        let client = options
            .connect(&args.nats_url)
            .await
            .map_err(|e| ProfileError::Broker(format!("Failed to connect: {}", e)))?;

        info!("Connected to NATS at {}", args.nats_url);

        Ok(Self { client })
    }

    /// Publish a message with headers
    pub async fn publish_with_headers(
        &self,
        subject: &str,
        headers: HeaderMap,
        payload: Bytes,
    ) -> Result<()> {
        self.client
            .publish_with_headers(subject.to_string(), headers, payload)
            .await
            .map_err(|e| ProfileError::Broker(format!("Publish to {} failed: {}", subject, e)))
    }

    /// Create a JetStream stream capturing `{subject}.>` for each subject tree
    pub async fn ensure_streams(&self, subjects: &[&str]) -> Result<()> {
        let context = jetstream::new(self.client.clone());

        for subject in subjects {
            let name = stream_name(subject);
            context
                .get_or_create_stream(jetstream::stream::Config {
                    name: name.clone(),
                    subjects: vec![format!("{}.>", subject)],
                    max_age: STREAM_MAX_AGE,
                    storage: StorageType::File,
                    ..Default::default()
                })
                .await
                .map_err(|e| ProfileError::Broker(format!("Failed to create stream {}: {}", name, e)))?;

            info!("Using stream {} with subjects {}.>", name, subject);
        }

        Ok(())
    }

    /// Flush pending messages
    pub async fn flush(&self) -> Result<()> {
        self.client
            .flush()
            .await
            .map_err(|e| ProfileError::Broker(format!("Flush failed: {}", e)))
    }
}

/// Stream names allow only alphanumerics, `-` and `_`
pub fn stream_name(subject: &str) -> String {
    subject
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_name() {
        assert_eq!(stream_name("ugc"), "UGC");
        assert_eq!(stream_name("view_progress"), "VIEW_PROGRESS");
        assert_eq!(stream_name("events.ugc"), "EVENTS_UGC");
    }
}
