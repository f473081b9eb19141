//! Profile routes

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

use super::json_response;
use super::response::parse_json;
use crate::db::schemas::ProfileUpdate;
use crate::models::User;
use crate::server::AppState;
use crate::types::Result;

/// GET /profile
pub async fn get(state: &AppState, user: &User) -> Result<Response<Full<Bytes>>> {
    let profile = state.ugc.get_profile(user).await?;
    json_response(StatusCode::OK, &profile)
}

/// PATCH /profile
pub async fn update(state: &AppState, user: &User, body: &[u8]) -> Result<Response<Full<Bytes>>> {
    let update: ProfileUpdate = parse_json(body)?;
    let profile = state.ugc.update_profile(&user.id, update).await?;
    json_response(StatusCode::OK, &profile)
}
