//! Like routes for movies and reviews
//!
//! Every like route answers with the target's current like stats.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

use super::json_response;
use crate::db::schemas::LikeTarget;
use crate::models::User;
use crate::server::AppState;
use crate::types::Result;

/// POST /like/{movie|review}/{id}
pub async fn add(
    state: &AppState,
    user: &User,
    target: LikeTarget,
    target_id: &str,
) -> Result<Response<Full<Bytes>>> {
    state.ugc.add_like(&user.id, target_id, target).await?;
    let stats = state.ugc.like_stats(&user.id, target_id, target).await?;
    json_response(StatusCode::CREATED, &stats)
}

/// DELETE /like/{movie|review}/{id}
pub async fn remove(
    state: &AppState,
    user: &User,
    target: LikeTarget,
    target_id: &str,
) -> Result<Response<Full<Bytes>>> {
    state.ugc.remove_like(&user.id, target_id, target).await?;
    let stats = state.ugc.like_stats(&user.id, target_id, target).await?;
    json_response(StatusCode::OK, &stats)
}

/// GET /like/{movie|review}/{id}
pub async fn stats(
    state: &AppState,
    user: &User,
    target: LikeTarget,
    target_id: &str,
) -> Result<Response<Full<Bytes>>> {
    let stats = state.ugc.like_stats(&user.id, target_id, target).await?;
    json_response(StatusCode::OK, &stats)
}
