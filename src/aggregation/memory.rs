//! Aggregations computed over the in-process store

use async_trait::async_trait;
use std::sync::Arc;

use super::{DetailedAggregator, MovieDetailStats, MovieStats, SummaryAggregator, SummaryKind};
use crate::db::schemas::LikeTarget;
use crate::db::{InMemoryUgcStore, Page};
use crate::types::Result;

/// Newest first, then page
fn page_newest_first<T: Clone>(items: Vec<&T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .rev()
        .skip(page.skip() as usize)
        .take(page.size as usize)
        .cloned()
        .collect()
}

pub struct InMemorySummaryAggregator {
    store: Arc<InMemoryUgcStore>,
    kind: SummaryKind,
}

impl InMemorySummaryAggregator {
    pub fn new(store: Arc<InMemoryUgcStore>, kind: SummaryKind) -> Self {
        Self { store, kind }
    }
}

#[async_trait]
impl SummaryAggregator for InMemorySummaryAggregator {
    fn kind(&self) -> SummaryKind {
        self.kind
    }

    async fn summarize(&self, user_id: &str, page: Page) -> Result<Vec<MovieStats>> {
        let data = self.store.read().await;

        let movies: Vec<(String, Option<f64>)> = match self.kind {
            SummaryKind::Bookmarks => page_newest_first(
                data.bookmarks.iter().filter(|b| b.user_id == user_id).collect(),
                page,
            )
            .into_iter()
            .map(|b| (b.movie_id, None))
            .collect(),
            SummaryKind::Likes => page_newest_first(
                data.likes
                    .iter()
                    .filter(|l| l.user_id == user_id && l.target_type == LikeTarget::Movie)
                    .collect(),
                page,
            )
            .into_iter()
            .map(|l| (l.target_id, None))
            .collect(),
            SummaryKind::History => page_newest_first(
                data.progress.iter().filter(|p| p.user_id == user_id).collect(),
                page,
            )
            .into_iter()
            .map(|p| (p.movie_id, Some(p.progress)))
            .collect(),
        };

        Ok(movies
            .into_iter()
            .map(|(movie_id, own_progress)| MovieStats {
                likes_count: data.like_count(&movie_id, LikeTarget::Movie),
                user_liked: data.has_like(user_id, &movie_id, LikeTarget::Movie),
                watch_progress: own_progress
                    .or_else(|| data.progress_of(user_id, &movie_id))
                    .unwrap_or(0.0),
                movie_id,
            })
            .collect())
    }
}

pub struct InMemoryDetailedAggregator {
    store: Arc<InMemoryUgcStore>,
}

impl InMemoryDetailedAggregator {
    pub fn new(store: Arc<InMemoryUgcStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DetailedAggregator for InMemoryDetailedAggregator {
    async fn detail(&self, user_id: &str, movie_id: &str) -> Result<MovieDetailStats> {
        let data = self.store.read().await;
        let bookmarks = data.bookmarks.iter().filter(|b| b.movie_id == movie_id);

        Ok(MovieDetailStats {
            movie_id: movie_id.to_string(),
            likes_count: data.like_count(movie_id, LikeTarget::Movie),
            user_liked: data.has_like(user_id, movie_id, LikeTarget::Movie),
            bookmarks_count: bookmarks.clone().count() as u64,
            user_bookmarked: bookmarks.clone().any(|b| b.user_id == user_id),
            watch_progress: data.progress_of(user_id, movie_id).unwrap_or(0.0),
        })
    }
}
