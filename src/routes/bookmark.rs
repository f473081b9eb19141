//! Bookmark routes

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde_json::json;

use super::json_response;
use crate::models::User;
use crate::server::AppState;
use crate::types::Result;

/// POST /bookmark/{movie_id}
pub async fn add(state: &AppState, user: &User, movie_id: &str) -> Result<Response<Full<Bytes>>> {
    state.ugc.add_bookmark(&user.id, movie_id).await?;
    json_response(
        StatusCode::CREATED,
        &json!({ "movie_id": movie_id, "bookmarked": true }),
    )
}

/// DELETE /bookmark/{movie_id}
pub async fn remove(
    state: &AppState,
    user: &User,
    movie_id: &str,
) -> Result<Response<Full<Bytes>>> {
    let removed = state.ugc.remove_bookmark(&user.id, movie_id).await?;
    json_response(
        StatusCode::OK,
        &json!({ "movie_id": movie_id, "bookmarked": false, "removed": removed }),
    )
}
