//! Review document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for reviews
pub const REVIEW_COLLECTION: &str = "reviews";

/// A user's written review of a movie
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ReviewDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: String,

    pub movie_id: String,

    pub review: String,
}

impl ReviewDoc {
    pub fn new(user_id: impl Into<String>, movie_id: impl Into<String>, review: impl Into<String>) -> Self {
        Self {
            id: None,
            metadata: Metadata::new(),
            user_id: user_id.into(),
            movie_id: movie_id.into(),
            review: review.into(),
        }
    }

    /// Hex id, empty until inserted
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

impl IntoIndexes for ReviewDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "movie_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("movie_id_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for ReviewDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
