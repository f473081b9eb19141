//! Like document schema
//!
//! One collection holds likes on movies and on reviews, told apart by
//! `target_type`.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for likes
pub const LIKE_COLLECTION: &str = "likes";

/// What a like points at
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LikeTarget {
    #[default]
    Movie,
    Review,
}

impl LikeTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Review => "review",
        }
    }

    /// Parse the target segment of a like route
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(Self::Movie),
            "review" => Some(Self::Review),
            _ => None,
        }
    }
}

impl fmt::Display for LikeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's like on a movie or review
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LikeDoc {
    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: String,

    /// Movie id or review id, depending on `target_type`
    pub target_id: String,

    pub target_type: LikeTarget,
}

impl LikeDoc {
    pub fn new(user_id: impl Into<String>, target_id: impl Into<String>, target_type: LikeTarget) -> Self {
        Self {
            metadata: Metadata::new(),
            user_id: user_id.into(),
            target_id: target_id.into(),
            target_type,
        }
    }
}

impl IntoIndexes for LikeDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "user_id": 1, "target_id": 1, "target_type": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("user_target_unique".to_string())
                        .build(),
                ),
            ),
            // Like counts look up by target
            (
                doc! { "target_id": 1, "target_type": 1 },
                Some(
                    IndexOptions::builder()
                        .name("target_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for LikeDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
