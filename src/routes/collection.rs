//! Collection routes: the user's bookmarks, likes and history, plus the
//! detailed view of a single movie

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Deserialize;

use super::json_response;
use crate::aggregation::SummaryKind;
use crate::db::Page;
use crate::models::User;
use crate::server::AppState;
use crate::types::{ProfileError, Result};

pub const DEFAULT_PAGE_SIZE: u64 = 50;

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default = "default_page_size")]
    page_size: u64,
    #[serde(default)]
    page_number: u64,
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Parse `page_size` / `page_number` from a query string
pub fn parse_page(query: Option<&str>) -> Result<Page> {
    let query: PageQuery = serde_urlencoded::from_str(query.unwrap_or(""))
        .map_err(|e| ProfileError::BadRequest(format!("Invalid paging parameters: {}", e)))?;

    if query.page_size < 1 {
        return Err(ProfileError::BadRequest(
            "page_size must be at least 1".into(),
        ));
    }

    let in_range = query
        .page_number
        .checked_mul(query.page_size)
        .and_then(|skip| i64::try_from(skip).ok())
        .and_then(|_| i64::try_from(query.page_size).ok())
        .is_some();
    if !in_range {
        return Err(ProfileError::BadRequest(
            "page_size and page_number are out of range".into(),
        ));
    }
    Ok(Page::new(query.page_number, query.page_size))
}

/// GET /collection/{bookmarks|likes|history}
pub async fn list(
    state: &AppState,
    user: &User,
    kind: SummaryKind,
    query: Option<&str>,
) -> Result<Response<Full<Bytes>>> {
    let page = parse_page(query)?;
    let search = state
        .search(kind)
        .ok_or_else(|| ProfileError::Internal(format!("No search configured for {}", kind)))?;

    let movies = search.get_user_movies(&user.id, page).await?;
    json_response(StatusCode::OK, &movies)
}

/// GET /collection/movie/{movie_id}
pub async fn movie(state: &AppState, user: &User, movie_id: &str) -> Result<Response<Full<Bytes>>> {
    let search = state
        .movie_search()
        .ok_or_else(|| ProfileError::Internal("No movie search configured".into()))?;

    let detail = search.get_movie(&user.id, movie_id).await?;
    json_response(StatusCode::OK, &detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_defaults() {
        let page = parse_page(None).unwrap();
        assert_eq!(page, Page::new(0, 50));
    }

    #[test]
    fn test_parse_page_explicit() {
        let page = parse_page(Some("page_size=10&page_number=3")).unwrap();
        assert_eq!(page.size, 10);
        assert_eq!(page.number, 3);
        assert_eq!(page.skip(), 30);
    }

    #[test]
    fn test_parse_page_rejects_zero_size() {
        let err = parse_page(Some("page_size=0")).unwrap_err();
        assert!(matches!(err, ProfileError::BadRequest(_)));
    }

    #[test]
    fn test_parse_page_rejects_overflowing_offsets() {
        let huge = format!("page_size=50&page_number={}", u64::MAX / 2);
        let err = parse_page(Some(&huge)).unwrap_err();
        assert!(matches!(err, ProfileError::BadRequest(_)));

        let huge = format!("page_size={}", u64::MAX);
        let err = parse_page(Some(&huge)).unwrap_err();
        assert!(matches!(err, ProfileError::BadRequest(_)));

        let max = format!("page_size=1&page_number={}", i64::MAX);
        assert_eq!(parse_page(Some(&max)).unwrap().skip_i64(), i64::MAX);
    }

    #[test]
    fn test_parse_page_rejects_garbage() {
        let err = parse_page(Some("page_number=-1")).unwrap_err();
        assert!(matches!(err, ProfileError::BadRequest(_)));
    }
}
