//! Cache-aside movie search
//!
//! Joins a user's aggregated UGC with movie metadata. Metadata comes from
//! the cache first; exactly the missing ids are fetched upstream in one
//! batch and written back with the cache TTL before returning.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::aggregation::{DetailedAggregator, SummaryAggregator, SummaryKind};
use crate::cache::CacheService;
use crate::db::Page;
use crate::models::{Movie, MovieDetail, MovieSummary};
use crate::services::MovieSource;
use crate::types::{ProfileError, Result};

/// Cache key for a movie id
pub fn movie_key(movie_id: &str) -> String {
    format!("movie:{}", movie_id)
}

/// Read side for one of a user's collections plus the detailed movie view
#[derive(Clone)]
pub struct MovieSearch {
    summary: Arc<dyn SummaryAggregator>,
    detailed: Arc<dyn DetailedAggregator>,
    cache: CacheService,
    movies: Arc<dyn MovieSource>,
}

impl MovieSearch {
    pub fn new(
        summary: Arc<dyn SummaryAggregator>,
        detailed: Arc<dyn DetailedAggregator>,
        cache: CacheService,
        movies: Arc<dyn MovieSource>,
    ) -> Self {
        Self {
            summary,
            detailed,
            cache,
            movies,
        }
    }

    pub fn kind(&self) -> SummaryKind {
        self.summary.kind()
    }

    /// One page of the user's movies, enriched with metadata
    pub async fn get_user_movies(&self, user_id: &str, page: Page) -> Result<Vec<MovieSummary>> {
        let rows = self.summary.summarize(user_id, page).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = rows.iter().map(|r| r.movie_id.clone()).collect();
        let mut movies = self.resolve_movies(&ids).await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            match movies.remove(&row.movie_id) {
                Some(movie) => summaries.push(MovieSummary {
                    movie,
                    likes_count: row.likes_count,
                    user_liked: row.user_liked,
                    watch_progress: row.watch_progress,
                }),
                None => warn!(
                    kind = %self.kind(),
                    movie_id = %row.movie_id,
                    "Movie metadata unavailable, skipping"
                ),
            }
        }

        Ok(summaries)
    }

    /// Detailed view of one movie for the user
    pub async fn get_movie(&self, user_id: &str, movie_id: &str) -> Result<MovieDetail> {
        let movie = self
            .resolve_movie(movie_id)
            .await?
            .ok_or_else(|| ProfileError::NotFound(format!("Movie {} not found", movie_id)))?;

        let stats = self.detailed.detail(user_id, movie_id).await?;

        Ok(MovieDetail {
            movie,
            likes_count: stats.likes_count,
            user_liked: stats.user_liked,
            bookmarks_count: stats.bookmarks_count,
            user_bookmarked: stats.user_bookmarked,
            watch_progress: stats.watch_progress,
        })
    }

    async fn resolve_movie(&self, movie_id: &str) -> Result<Option<Movie>> {
        let key = movie_key(movie_id);
        if let Some(movie) = self.cache.get_single::<Movie>(&key).await? {
            debug!(movie_id = movie_id, "Movie cache hit");
            return Ok(Some(movie));
        }

        let movie = self.movies.get_single(movie_id).await?;
        if let Some(movie) = &movie {
            self.cache.store_single(&key, movie, None).await?;
        }
        Ok(movie)
    }

    /// Batch cache-aside lookup keyed by movie id
    async fn resolve_movies(&self, ids: &[String]) -> Result<HashMap<String, Movie>> {
        let keys: Vec<String> = ids.iter().map(|id| movie_key(id)).collect();
        let cached = self.cache.get_many::<Movie>(&keys).await?;

        let mut found = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();
        for (id, key) in ids.iter().zip(&keys) {
            match cached.get(key).cloned().flatten() {
                Some(movie) => {
                    found.insert(id.clone(), movie);
                }
                None if !missing.contains(id) => missing.push(id.clone()),
                None => {}
            }
        }

        debug!(hits = found.len(), misses = missing.len(), "Movie cache lookup");
        if missing.is_empty() {
            return Ok(found);
        }

        let fetched = self.movies.get_several(&missing).await?;
        let backfill: HashMap<String, Movie> = fetched
            .into_iter()
            .filter(|m| missing.contains(&m.id))
            .map(|m| (m.id.clone(), m))
            .collect();

        if !backfill.is_empty() {
            let entries: HashMap<String, &Movie> =
                backfill.iter().map(|(id, m)| (movie_key(id), m)).collect();
            self.cache.store_many(&entries, None).await?;
        }

        found.extend(backfill);
        Ok(found)
    }
}
