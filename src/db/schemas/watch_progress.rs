//! Watch progress document schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for watch progress
pub const WATCH_PROGRESS_COLLECTION: &str = "watch_progress";

/// How far a user got through a movie
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct WatchProgressDoc {
    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: String,

    pub movie_id: String,

    /// Fraction watched, 0.0 to 1.0
    pub progress: f64,
}

impl IntoIndexes for WatchProgressDoc {
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

impl MutMetadata for WatchProgressDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
