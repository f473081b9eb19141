//! Watch progress route

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde_json::json;

use super::json_response;
use super::response::parse_json;
use crate::models::{MovieProgress, User};
use crate::server::AppState;
use crate::types::Result;

/// POST /progress
pub async fn save(state: &AppState, user: &User, body: &[u8]) -> Result<Response<Full<Bytes>>> {
    let progress: MovieProgress = parse_json(body)?;
    let movie_id = progress.movie_id.clone();
    let fraction = state.ugc.save_progress(user, progress).await?;
    json_response(
        StatusCode::OK,
        &json!({ "movie_id": movie_id, "progress": fraction }),
    )
}
