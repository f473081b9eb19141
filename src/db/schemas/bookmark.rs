//! Bookmark document schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for bookmarks
pub const BOOKMARK_COLLECTION: &str = "bookmarks";

/// A movie saved by a user
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BookmarkDoc {
    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: String,

    pub movie_id: String,
}

impl BookmarkDoc {
    pub fn new(user_id: impl Into<String>, movie_id: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::new(),
            user_id: user_id.into(),
            movie_id: movie_id.into(),
        }
    }
}

impl IntoIndexes for BookmarkDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1, "movie_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_movie_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for BookmarkDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
