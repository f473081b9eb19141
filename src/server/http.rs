//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection. Every request passes
//! through the same gate before routing:
//!
//! 1. CORS preflight is answered immediately
//! 2. Production mode rejects requests without `X-Request-Id`
//! 3. The token bucket rejects requests once drained
//! 4. `/health` is served without authentication
//! 5. Everything under the API prefix is authenticated and dispatched

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::HeaderValue;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::aggregation::SummaryKind;
use crate::auth::Authenticator;
use crate::cache::{spawn_cleanup_task, MemoryCache};
use crate::config::Args;
use crate::rate_limit::TokenBucket;
use crate::routes;
use crate::search::MovieSearch;
use crate::types::ProfileError;
use crate::ugc::UgcService;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Header carrying the caller's request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Write side for all UGC
    pub ugc: UgcService,
    /// One read side per user collection
    pub searches: Vec<MovieSearch>,
    /// Resolves the caller of API requests
    pub auth: Arc<dyn Authenticator>,
    /// Process-wide admission control
    pub limiter: TokenBucket,
    /// Set when movie metadata is cached in-process instead of Redis
    pub memory_cache: Option<Arc<MemoryCache>>,
    /// Whether UGC is persisted in MongoDB (false means in-memory fallback)
    pub mongo_connected: bool,
    /// Whether events go to NATS (false means logged only)
    pub nats_connected: bool,
    pub started_at: Instant,
}

impl AppState {
    /// Read side for one of the user's collections
    pub fn search(&self, kind: SummaryKind) -> Option<&MovieSearch> {
        self.searches.iter().find(|s| s.kind() == kind)
    }

    /// Read side used for the detailed single-movie view
    pub fn movie_search(&self) -> Option<&MovieSearch> {
        self.searches.first()
    }
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), ProfileError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "UGC profile service listening on {} (API under {})",
        state.args.listen, state.args.api_path
    );

    if !state.args.auth_enabled {
        warn!(
            "Authentication disabled - all requests act as user {}",
            state.args.dev_user_id
        );
    }

    if let Some(ref cache) = state.memory_cache {
        spawn_cleanup_task(Arc::clone(cache), Duration::from_secs(60));
        info!(
            "In-process movie cache enabled (max {} entries)",
            state.args.cache_max_entries
        );
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Handle one HTTP request
pub async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    if method == Method::OPTIONS {
        return Ok(to_boxed(routes::preflight_response()));
    }

    let request_id = match request_id_of(&req) {
        Some(id) => id,
        None if state.args.production_mode => {
            return Ok(to_boxed(routes::error_response(&ProfileError::BadRequest(
                "X-Request-Id header is required".into(),
            ))));
        }
        None => uuid::Uuid::new_v4().to_string(),
    };

    if !state.limiter.try_acquire() {
        warn!(request_id = %request_id, "Rate limit exceeded for {}", addr);
        let response = routes::error_response(&ProfileError::TooManyRequests);
        return Ok(with_request_id(to_boxed(response), &request_id));
    }

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => routes::health_check(&state),
        _ if state.args.is_api_path(&path) => {
            routes::handle_api_request(Arc::clone(&state), req).await
        }
        _ => {
            debug!("No route for {} {}", method, path);
            routes::not_found_response()
        }
    };

    Ok(with_request_id(to_boxed(response), &request_id))
}

fn request_id_of(req: &Request<Incoming>) -> Option<String> {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn with_request_id(mut response: Response<BoxBody>, request_id: &str) -> Response<BoxBody> {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Convert a Full<Bytes> response to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}
