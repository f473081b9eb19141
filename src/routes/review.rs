//! Review routes

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::json_response;
use super::response::parse_json;
use crate::db::schemas::ReviewDoc;
use crate::models::User;
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Deserialize)]
struct ReviewBody {
    review: String,
}

#[derive(Debug, Deserialize)]
struct ReviewIdBody {
    id: String,
}

/// Review as returned to clients, with a hex id and RFC 3339 timestamps
#[derive(Debug, Serialize, PartialEq)]
pub struct ReviewView {
    pub id: String,
    pub user_id: String,
    pub movie_id: String,
    pub review: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<&ReviewDoc> for ReviewView {
    fn from(doc: &ReviewDoc) -> Self {
        Self {
            id: doc.id_hex(),
            user_id: doc.user_id.clone(),
            movie_id: doc.movie_id.clone(),
            review: doc.review.clone(),
            created_at: doc
                .metadata
                .created_at
                .and_then(|d| d.try_to_rfc3339_string().ok()),
            updated_at: doc
                .metadata
                .updated_at
                .and_then(|d| d.try_to_rfc3339_string().ok()),
        }
    }
}

/// POST /review/{movie_id}
pub async fn add(
    state: &AppState,
    user: &User,
    movie_id: &str,
    body: &[u8],
) -> Result<Response<Full<Bytes>>> {
    let ReviewBody { review } = parse_json(body)?;
    let stored = state.ugc.add_review(&user.id, movie_id, &review).await?;
    json_response(StatusCode::CREATED, &ReviewView::from(&stored))
}

/// GET /review/{movie_id}
pub async fn list(state: &AppState, movie_id: &str) -> Result<Response<Full<Bytes>>> {
    let reviews: Vec<ReviewView> = state
        .ugc
        .movie_reviews(movie_id)
        .await?
        .iter()
        .map(ReviewView::from)
        .collect();
    json_response(StatusCode::OK, &reviews)
}

/// PATCH /review/update/{review_id}
pub async fn update(
    state: &AppState,
    user: &User,
    review_id: &str,
    body: &[u8],
) -> Result<Response<Full<Bytes>>> {
    let ReviewBody { review } = parse_json(body)?;
    let updated = state.ugc.update_review(&user.id, review_id, &review).await?;
    json_response(StatusCode::OK, &ReviewView::from(&updated))
}

/// DELETE /review/delete-review with `{"id": ...}`
pub async fn remove(state: &AppState, user: &User, body: &[u8]) -> Result<Response<Full<Bytes>>> {
    let ReviewIdBody { id } = parse_json(body)?;
    state.ugc.remove_review(&user.id, &id).await?;
    json_response(StatusCode::OK, &json!({ "id": id, "removed": true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    #[test]
    fn test_review_view_uses_hex_id() {
        let mut doc = ReviewDoc::new("u1", "m1", "Great");
        let id = ObjectId::new();
        doc.id = Some(id);

        let view = ReviewView::from(&doc);
        assert_eq!(view.id, id.to_hex());
        assert_eq!(view.review, "Great");
        assert!(view.created_at.is_some());

        let json = serde_json::to_value(&view).unwrap();
        assert!(json["id"].is_string());
    }
}
