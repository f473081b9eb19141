//! Fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use clap::Parser;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ugc_profile::aggregation::{
    DetailedAggregator, InMemoryDetailedAggregator, InMemorySummaryAggregator, SummaryAggregator,
    SummaryKind,
};
use ugc_profile::auth::{extract_bearer, Authenticator};
use ugc_profile::broker::MessageBroker;
use ugc_profile::cache::{CacheService, MemoryCache};
use ugc_profile::db::{InMemoryUgcStore, UgcStores};
use ugc_profile::models::{Movie, User};
use ugc_profile::rate_limit::TokenBucket;
use ugc_profile::retry::RetryPolicy;
use ugc_profile::search::MovieSearch;
use ugc_profile::services::MovieSource;
use ugc_profile::ugc::UgcService;
use ugc_profile::{AppState, Args, ProfileError, Result};

/// Bearer token is taken as the user id
pub struct TokenIsUser;

#[async_trait]
impl Authenticator for TokenIsUser {
    async fn authenticate(&self, authorization: Option<&str>) -> Result<User> {
        authorization
            .and_then(extract_bearer)
            .map(|token| User::with_id(token))
            .ok_or_else(|| ProfileError::Unauthorized("Missing bearer token".into()))
    }
}

#[derive(Default)]
pub struct RecordingBroker {
    subject: String,
    sent: Mutex<Vec<(String, Value)>>,
}

impl RecordingBroker {
    pub fn new(subject: &str) -> Arc<Self> {
        Arc::new(Self {
            subject: subject.to_string(),
            ..Default::default()
        })
    }

    pub fn keys(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn last(&self) -> Option<(String, Value)> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl MessageBroker for RecordingBroker {
    async fn send(&self, key: &str, event: Value) -> Result<()> {
        self.sent.lock().unwrap().push((key.to_string(), event));
        Ok(())
    }

    fn subject(&self) -> &str {
        &self.subject
    }
}

#[derive(Default)]
pub struct Catalogue {
    pub batch_calls: Mutex<usize>,
}

impl Catalogue {
    pub const KNOWN: [&'static str; 3] = ["m1", "m2", "m3"];

    pub fn is_known(id: &str) -> bool {
        Self::KNOWN.iter().any(|known| *known == id)
    }

    pub fn movie(id: &str) -> Movie {
        Movie {
            id: id.to_string(),
            title: format!("Movie {}", id),
            ..Default::default()
        }
    }
}

#[async_trait]
impl MovieSource for Catalogue {
    async fn get_single(&self, id: &str) -> Result<Option<Movie>> {
        Ok(Self::is_known(id).then(|| Self::movie(id)))
    }

    async fn get_several(&self, ids: &[String]) -> Result<Vec<Movie>> {
        *self.batch_calls.lock().unwrap() += 1;
        Ok(ids
            .iter()
            .filter(|id| Self::is_known(id))
            .map(|id| Self::movie(id))
            .collect())
    }
}

/// In-memory application state plus handles on its fakes
pub struct Fixture {
    pub state: AppState,
    pub ugc_events: Arc<RecordingBroker>,
    pub progress_events: Arc<RecordingBroker>,
    pub catalogue: Arc<Catalogue>,
}

impl Fixture {
    /// Build state from command line flags (program name excluded)
    pub fn with_flags(flags: &[&str]) -> Self {
        let argv = std::iter::once("ugc-profile").chain(flags.iter().copied());
        let args = Args::try_parse_from(argv).unwrap();
        let limiter = TokenBucket::new(args.token_bucket_capacity, args.token_bucket_rate);

        let store = Arc::new(InMemoryUgcStore::new());
        let ugc_events = RecordingBroker::new("ugc");
        let progress_events = RecordingBroker::new("view_progress");
        let catalogue = Arc::new(Catalogue::default());

        let memory_cache = Arc::new(MemoryCache::new(100));
        let cache = CacheService::new(
            memory_cache.clone(),
            Duration::from_secs(60),
            RetryPolicy::none(),
        );
        let detailed: Arc<dyn DetailedAggregator> =
            Arc::new(InMemoryDetailedAggregator::new(Arc::clone(&store)));
        let searches = SummaryKind::ALL
            .iter()
            .map(|kind| {
                let summary: Arc<dyn SummaryAggregator> =
                    Arc::new(InMemorySummaryAggregator::new(Arc::clone(&store), *kind));
                MovieSearch::new(
                    summary,
                    Arc::clone(&detailed),
                    cache.clone(),
                    catalogue.clone(),
                )
            })
            .collect();

        let state = AppState {
            ugc: UgcService::new(
                UgcStores::in_memory(store),
                ugc_events.clone(),
                progress_events.clone(),
            ),
            searches,
            auth: Arc::new(TokenIsUser),
            limiter,
            memory_cache: Some(memory_cache),
            mongo_connected: false,
            nats_connected: false,
            started_at: Instant::now(),
            args,
        };

        Self {
            state,
            ugc_events,
            progress_events,
            catalogue,
        }
    }
}
