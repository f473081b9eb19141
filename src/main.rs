//! UGC profile service entry point

use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ugc_profile::{
    aggregation::{
        DetailedAggregator, InMemoryDetailedAggregator, InMemorySummaryAggregator,
        MongoDetailedAggregator, MongoSummaryAggregator, SummaryAggregator, SummaryKind,
    },
    auth::{AuthApi, Authenticator, DevAuthenticator},
    broker::{LoggingBroker, MessageBroker, NatsMessageBroker},
    cache::{CacheBackend, CacheService, MemoryCache, RedisCache},
    config::Args,
    db::{InMemoryUgcStore, MongoClient, UgcStores},
    nats::NatsClient,
    rate_limit::TokenBucket,
    search::MovieSearch,
    server::{self, AppState},
    services::{MovieApi, MovieApiConfig, MovieSource},
    ugc::UgcService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ugc_profile={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  UGC Profile Service");
    info!("======================================");
    info!("Listen: {} (API under {})", args.listen, args.api_path);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Request id required: {}", args.production_mode);
    info!("MongoDB: {} / {}", args.mongodb_uri, args.mongodb_db);
    info!("NATS: {} (subjects: {})", args.nats.nats_url, args.nats.subjects().join(", "));
    info!("Redis: {}", args.redis_url.as_deref().unwrap_or("(in-process cache)"));
    info!("Movie API: {}", args.movie_api_url);
    info!(
        "Auth: {}",
        if args.auth_enabled { args.auth_url.as_str() } else { "disabled" }
    );
    info!(
        "Token bucket: {} tokens, {}/s",
        args.token_bucket_capacity, args.token_bucket_rate
    );
    info!("======================================");

    // MongoDB (optional in dev mode, in-memory fallback)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    // NATS (optional in dev mode, events are logged instead)
    let nats = match NatsClient::new(&args.nats, "ugc-profile").await {
        Ok(client) => {
            info!("NATS connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("NATS connection failed (dev mode, logging events instead): {}", e);
                None
            } else {
                error!("NATS connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    if let Some(ref client) = nats {
        if args.nats.ensure_streams {
            if let Err(e) = client.ensure_streams(&args.nats.subjects()).await {
                error!("Failed to ensure JetStream streams: {}", e);
                std::process::exit(1);
            }
        }
    }

    // Movie metadata cache
    let mut memory_cache = None;
    let cache_backend: Arc<dyn CacheBackend> = match args.redis_url.as_deref() {
        Some(url) => match RedisCache::connect(url).await {
            Ok(redis) => {
                info!("Redis connected successfully");
                Arc::new(redis)
            }
            Err(e) if args.dev_mode => {
                warn!("Redis connection failed (dev mode, using in-process cache): {}", e);
                let cache = Arc::new(MemoryCache::new(args.cache_max_entries));
                memory_cache = Some(Arc::clone(&cache));
                cache
            }
            Err(e) => {
                error!("Redis connection failed: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            let cache = Arc::new(MemoryCache::new(args.cache_max_entries));
            memory_cache = Some(Arc::clone(&cache));
            cache
        }
    };
    let cache = CacheService::new(cache_backend, args.cache_ttl(), args.retry_policy());

    let movies: Arc<dyn MovieSource> = Arc::new(MovieApi::new(MovieApiConfig {
        base_url: args.movie_api_url.clone(),
        request_timeout: args.request_timeout(),
        retry: args.retry_policy(),
    }));

    // Stores and aggregators
    let (stores, summaries, detailed): (
        UgcStores,
        Vec<Arc<dyn SummaryAggregator>>,
        Arc<dyn DetailedAggregator>,
    ) = match mongo {
        Some(ref client) => {
            let stores = UgcStores::mongo(client).await?;
            let summaries: Vec<Arc<dyn SummaryAggregator>> = SummaryKind::ALL
                .iter()
                .map(|kind| {
                    Arc::new(MongoSummaryAggregator::new(client.clone(), *kind))
                        as Arc<dyn SummaryAggregator>
                })
                .collect();
            let detailed: Arc<dyn DetailedAggregator> =
                Arc::new(MongoDetailedAggregator::new(client.clone()));
            (stores, summaries, detailed)
        }
        None => {
            let store = Arc::new(InMemoryUgcStore::new());
            let summaries: Vec<Arc<dyn SummaryAggregator>> = SummaryKind::ALL
                .iter()
                .map(|kind| {
                    Arc::new(InMemorySummaryAggregator::new(Arc::clone(&store), *kind))
                        as Arc<dyn SummaryAggregator>
                })
                .collect();
            let detailed: Arc<dyn DetailedAggregator> =
                Arc::new(InMemoryDetailedAggregator::new(Arc::clone(&store)));
            (UgcStores::in_memory(store), summaries, detailed)
        }
    };

    let searches: Vec<MovieSearch> = summaries
        .into_iter()
        .map(|summary| {
            MovieSearch::new(summary, Arc::clone(&detailed), cache.clone(), Arc::clone(&movies))
        })
        .collect();

    // Event brokers
    let ugc_events: Arc<dyn MessageBroker>;
    let progress_events: Arc<dyn MessageBroker>;
    match nats {
        Some(ref client) => {
            ugc_events = Arc::new(NatsMessageBroker::new(client.clone(), &args.nats.ugc_subject));
            progress_events = Arc::new(NatsMessageBroker::new(
                client.clone(),
                &args.nats.progress_subject,
            ));
        }
        None => {
            ugc_events = Arc::new(LoggingBroker::new(&args.nats.ugc_subject));
            progress_events = Arc::new(LoggingBroker::new(&args.nats.progress_subject));
        }
    }

    let auth: Arc<dyn Authenticator> = if args.auth_enabled {
        Arc::new(AuthApi::new(&args.auth_url, args.request_timeout(), args.retry_policy()))
    } else {
        Arc::new(DevAuthenticator::new(&args.dev_user_id))
    };

    let state = Arc::new(AppState {
        ugc: UgcService::new(stores, ugc_events, progress_events),
        searches,
        auth,
        limiter: TokenBucket::new(args.token_bucket_capacity, args.token_bucket_rate),
        memory_cache,
        mongo_connected: mongo.is_some(),
        nats_connected: nats.is_some(),
        started_at: Instant::now(),
        args,
    });

    tokio::select! {
        result = server::run(state) => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            if let Some(ref client) = nats {
                if let Err(e) = client.flush().await {
                    warn!("Failed to flush NATS on shutdown: {}", e);
                }
            }
        }
    }

    Ok(())
}
