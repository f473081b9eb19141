//! Content service client for movie metadata
//!
//! `GET {base}/movies?id={id}` for one movie, `GET {base}/movies?ids=a,b`
//! for a batch. Every call runs under the retry policy; transport errors
//! and 5xx responses are retried, any other non-200 answer means "no such
//! movie". A 200 with an undecodable body fails without retrying.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::Movie;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::{ProfileError, Result};

/// Source of movie metadata
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn get_single(&self, id: &str) -> Result<Option<Movie>>;

    /// Fetch several movies; unknown ids are simply absent from the result
    async fn get_several(&self, ids: &[String]) -> Result<Vec<Movie>>;
}

/// Configuration for the movie API client
#[derive(Debug, Clone)]
pub struct MovieApiConfig {
    /// Base URL, e.g. `http://content:8001/api/v1`
    pub base_url: String,
    /// Timeout for HTTP requests (default: 5 seconds)
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for MovieApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001/api/v1".to_string(),
            request_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

/// HTTP client for the content service
pub struct MovieApi {
    config: MovieApiConfig,
    http_client: reqwest::Client,
}

impl MovieApi {
    pub fn new(config: MovieApiConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("ugc-profile/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
        }
    }

    fn movies_url(&self) -> String {
        format!("{}/movies", self.config.base_url.trim_end_matches('/'))
    }

    /// One request; `Ok(None)` for a definitive non-200 answer
    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        query: Vec<(&'static str, String)>,
    ) -> Result<Option<T>> {
        let response = self
            .http_client
            .get(self.movies_url())
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ProfileError::Upstream(format!(
                "Movie API returned {}",
                status
            )));
        }
        if status != StatusCode::OK {
            debug!(status = %status, "Movie API returned no result");
            return Ok(None);
        }

        let body = response.json::<T>().await.map_err(|e| {
            ProfileError::UpstreamInvalid(format!("Invalid movie API response: {}", e))
        })?;
        Ok(Some(body))
    }
}

#[async_trait]
impl MovieSource for MovieApi {
    async fn get_single(&self, id: &str) -> Result<Option<Movie>> {
        retry_with_backoff(&self.config.retry, "movie_api.get_single", || {
            self.fetch::<Movie>(vec![("id", id.to_string())])
        })
        .await
    }

    async fn get_several(&self, ids: &[String]) -> Result<Vec<Movie>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let movies = retry_with_backoff(&self.config.retry, "movie_api.get_several", || {
            self.fetch::<Vec<Option<Movie>>>(vec![("ids", joined.clone())])
        })
        .await?;

        let movies: Vec<Movie> = movies.unwrap_or_default().into_iter().flatten().collect();
        if movies.len() < ids.len() {
            warn!(
                requested = ids.len(),
                returned = movies.len(),
                "Movie API returned fewer movies than requested"
            );
        }
        Ok(movies)
    }
}
