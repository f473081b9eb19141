//! Per-movie UGC aggregation
//!
//! Summary aggregations page through one of a user's collections
//! (bookmarks, liked movies, watch history) and attach like counts and
//! watch progress per movie. The detailed aggregation builds the full
//! per-user view of a single movie.

mod memory;
mod mongo;
pub mod pipeline;

pub use memory::{InMemoryDetailedAggregator, InMemorySummaryAggregator};
pub use mongo::{MongoDetailedAggregator, MongoSummaryAggregator};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::schemas::{BOOKMARK_COLLECTION, LIKE_COLLECTION, WATCH_PROGRESS_COLLECTION};
use crate::db::Page;
use crate::types::Result;

/// Which of a user's collections a summary walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryKind {
    Bookmarks,
    Likes,
    History,
}

impl SummaryKind {
    pub const ALL: [SummaryKind; 3] = [Self::Bookmarks, Self::Likes, Self::History];

    /// Route segment naming this collection
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bookmarks => "bookmarks",
            Self::Likes => "likes",
            Self::History => "history",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Collection the pipeline starts from
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Bookmarks => BOOKMARK_COLLECTION,
            Self::Likes => LIKE_COLLECTION,
            Self::History => WATCH_PROGRESS_COLLECTION,
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-movie projection of a summary aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieStats {
    pub movie_id: String,
    pub likes_count: u64,
    pub user_liked: bool,
    #[serde(default)]
    pub watch_progress: f64,
}

/// Projection of the detailed aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetailStats {
    pub movie_id: String,
    pub likes_count: u64,
    pub user_liked: bool,
    pub bookmarks_count: u64,
    pub user_bookmarked: bool,
    #[serde(default)]
    pub watch_progress: f64,
}

#[async_trait]
pub trait SummaryAggregator: Send + Sync {
    fn kind(&self) -> SummaryKind;

    async fn summarize(&self, user_id: &str, page: Page) -> Result<Vec<MovieStats>>;
}

#[async_trait]
pub trait DetailedAggregator: Send + Sync {
    async fn detail(&self, user_id: &str, movie_id: &str) -> Result<MovieDetailStats>;
}
