//! HTTP routes for the profile service
//!
//! Everything below the API prefix is authenticated first. Only then is the
//! body read, capped at `max_body_bytes`, and the request matched against
//! `ApiRoute` and handed to the per-resource handler.

pub mod bookmark;
pub mod collection;
pub mod health;
pub mod like;
pub mod profile;
pub mod progress;
pub mod response;
pub mod review;

pub use health::{health_check, HealthResponse};
pub use response::{error_response, json_response, not_found_response, preflight_response};

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::AUTHORIZATION;
use hyper::{Method, Request, Response};
use std::sync::Arc;

use crate::aggregation::SummaryKind;
use crate::db::schemas::LikeTarget;
use crate::models::User;
use crate::server::AppState;
use crate::types::{ProfileError, Result};

/// A parsed API route, relative to the API prefix
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApiRoute<'a> {
    AddBookmark(&'a str),
    RemoveBookmark(&'a str),
    AddLike(LikeTarget, &'a str),
    RemoveLike(LikeTarget, &'a str),
    LikeStats(LikeTarget, &'a str),
    AddReview(&'a str),
    MovieReviews(&'a str),
    UpdateReview(&'a str),
    RemoveReview,
    GetProfile,
    UpdateProfile,
    SaveProgress,
    Collection(SummaryKind),
    CollectionMovie(&'a str),
}

impl<'a> ApiRoute<'a> {
    /// Match a method and a path with the API prefix already stripped
    pub fn parse(method: &Method, path: &'a str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        let route = match (method, segments.as_slice()) {
            (&Method::POST, ["bookmark", id]) => Self::AddBookmark(*id),
            (&Method::DELETE, ["bookmark", id]) => Self::RemoveBookmark(*id),

            (&Method::POST, ["like", target, id]) => Self::AddLike(LikeTarget::parse(target)?, *id),
            (&Method::DELETE, ["like", target, id]) => {
                Self::RemoveLike(LikeTarget::parse(target)?, *id)
            }
            (&Method::GET, ["like", target, id]) => Self::LikeStats(LikeTarget::parse(target)?, *id),

            (&Method::PATCH, ["review", "update", id]) => Self::UpdateReview(*id),
            (&Method::DELETE, ["review", "delete-review"]) => Self::RemoveReview,
            (&Method::POST, ["review", id]) => Self::AddReview(*id),
            (&Method::GET, ["review", id]) => Self::MovieReviews(*id),

            (&Method::GET, ["profile"]) => Self::GetProfile,
            (&Method::PATCH, ["profile"]) => Self::UpdateProfile,

            (&Method::POST, ["progress"]) => Self::SaveProgress,

            (&Method::GET, ["collection", "movie", id]) => Self::CollectionMovie(*id),
            (&Method::GET, ["collection", kind]) => Self::Collection(SummaryKind::parse(kind)?),

            _ => return None,
        };
        Some(route)
    }
}

/// Entry point for requests under the API prefix
pub async fn handle_api_request(state: Arc<AppState>, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();
    let authorization = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let result = async {
        let user = state.auth.authenticate(authorization).await?;
        let body = response::read_body(body, state.args.max_body_bytes).await?;
        route(
            &state,
            &user,
            &parts.method,
            parts.uri.path(),
            parts.uri.query(),
            body,
        )
        .await
    }
    .await;

    result.unwrap_or_else(|e| error_response(&e))
}

/// Authenticate the caller and run the matching handler on a buffered body
pub async fn dispatch(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
    authorization: Option<&str>,
    body: Bytes,
) -> Result<Response<Full<Bytes>>> {
    let user = state.auth.authenticate(authorization).await?;
    route(state, &user, method, path, query, body).await
}

/// Run the handler matching an authenticated request
async fn route(
    state: &AppState,
    user: &User,
    method: &Method,
    path: &str,
    query: Option<&str>,
    body: Bytes,
) -> Result<Response<Full<Bytes>>> {
    let relative = path.strip_prefix(state.args.api_path.as_str()).unwrap_or(path);
    let api_route = ApiRoute::parse(method, relative)
        .ok_or_else(|| ProfileError::NotFound(format!("No route for {} {}", method, path)))?;

    match api_route {
        ApiRoute::AddBookmark(movie_id) => bookmark::add(state, user, movie_id).await,
        ApiRoute::RemoveBookmark(movie_id) => bookmark::remove(state, user, movie_id).await,
        ApiRoute::AddLike(target, id) => like::add(state, user, target, id).await,
        ApiRoute::RemoveLike(target, id) => like::remove(state, user, target, id).await,
        ApiRoute::LikeStats(target, id) => like::stats(state, user, target, id).await,
        ApiRoute::AddReview(movie_id) => review::add(state, user, movie_id, &body).await,
        ApiRoute::MovieReviews(movie_id) => review::list(state, movie_id).await,
        ApiRoute::UpdateReview(review_id) => review::update(state, user, review_id, &body).await,
        ApiRoute::RemoveReview => review::remove(state, user, &body).await,
        ApiRoute::GetProfile => profile::get(state, user).await,
        ApiRoute::UpdateProfile => profile::update(state, user, &body).await,
        ApiRoute::SaveProgress => progress::save(state, user, &body).await,
        ApiRoute::Collection(kind) => collection::list(state, user, kind, query).await,
        ApiRoute::CollectionMovie(movie_id) => collection::movie(state, user, movie_id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bookmark_routes() {
        assert_eq!(
            ApiRoute::parse(&Method::POST, "/bookmark/tt01"),
            Some(ApiRoute::AddBookmark("tt01"))
        );
        assert_eq!(
            ApiRoute::parse(&Method::DELETE, "/bookmark/tt01/"),
            Some(ApiRoute::RemoveBookmark("tt01"))
        );
        assert_eq!(ApiRoute::parse(&Method::GET, "/bookmark/tt01"), None);
        assert_eq!(ApiRoute::parse(&Method::POST, "/bookmark/"), None);
    }

    #[test]
    fn test_parse_like_routes() {
        assert_eq!(
            ApiRoute::parse(&Method::GET, "/like/review/abc"),
            Some(ApiRoute::LikeStats(LikeTarget::Review, "abc"))
        );
        assert_eq!(
            ApiRoute::parse(&Method::POST, "/like/movie/m1"),
            Some(ApiRoute::AddLike(LikeTarget::Movie, "m1"))
        );
        assert_eq!(ApiRoute::parse(&Method::POST, "/like/actor/m1"), None);
    }

    #[test]
    fn test_parse_review_routes() {
        assert_eq!(
            ApiRoute::parse(&Method::PATCH, "/review/update/r1"),
            Some(ApiRoute::UpdateReview("r1"))
        );
        assert_eq!(
            ApiRoute::parse(&Method::DELETE, "/review/delete-review"),
            Some(ApiRoute::RemoveReview)
        );
        assert_eq!(
            ApiRoute::parse(&Method::POST, "/review/m1"),
            Some(ApiRoute::AddReview("m1"))
        );
        assert_eq!(
            ApiRoute::parse(&Method::GET, "/review/m1"),
            Some(ApiRoute::MovieReviews("m1"))
        );
    }

    #[test]
    fn test_parse_collection_routes() {
        assert_eq!(
            ApiRoute::parse(&Method::GET, "/collection/history"),
            Some(ApiRoute::Collection(SummaryKind::History))
        );
        assert_eq!(
            ApiRoute::parse(&Method::GET, "/collection/movie/m1"),
            Some(ApiRoute::CollectionMovie("m1"))
        );
        assert_eq!(ApiRoute::parse(&Method::GET, "/collection/reviews"), None);
    }

    #[test]
    fn test_parse_profile_and_progress() {
        assert_eq!(ApiRoute::parse(&Method::GET, "/profile"), Some(ApiRoute::GetProfile));
        assert_eq!(
            ApiRoute::parse(&Method::PATCH, "/profile"),
            Some(ApiRoute::UpdateProfile)
        );
        assert_eq!(
            ApiRoute::parse(&Method::POST, "/progress"),
            Some(ApiRoute::SaveProgress)
        );
        assert_eq!(ApiRoute::parse(&Method::DELETE, "/profile"), None);
    }
}
