//! In-process UGC store
//!
//! Used when MongoDB is unreachable in dev mode, and by tests.

use async_trait::async_trait;
use bson::oid::ObjectId;
use std::collections::HashMap;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::db::schemas::{
    BookmarkDoc, LikeDoc, LikeTarget, Metadata, ProfileDoc, ProfileUpdate, ReviewDoc,
    WatchProgressDoc,
};
use crate::db::stores::{
    BookmarkStore, LikeStats, LikeStore, ProfileStore, ReviewStore, WatchProgressStore,
};
use crate::types::Result;

/// Raw contents of the in-process store, in insertion order
#[derive(Debug, Default)]
pub struct UgcData {
    pub bookmarks: Vec<BookmarkDoc>,
    pub likes: Vec<LikeDoc>,
    pub reviews: Vec<ReviewDoc>,
    pub progress: Vec<WatchProgressDoc>,
    pub profiles: HashMap<String, ProfileDoc>,
}

impl UgcData {
    pub fn like_count(&self, target_id: &str, target: LikeTarget) -> u64 {
        self.likes
            .iter()
            .filter(|l| l.target_id == target_id && l.target_type == target)
            .count() as u64
    }

    pub fn has_like(&self, user_id: &str, target_id: &str, target: LikeTarget) -> bool {
        self.likes
            .iter()
            .any(|l| l.user_id == user_id && l.target_id == target_id && l.target_type == target)
    }

    pub fn progress_of(&self, user_id: &str, movie_id: &str) -> Option<f64> {
        self.progress
            .iter()
            .find(|p| p.user_id == user_id && p.movie_id == movie_id)
            .map(|p| p.progress)
    }
}

/// In-memory implementation of every store trait
#[derive(Debug, Default)]
pub struct InMemoryUgcStore {
    data: RwLock<UgcData>,
}

impl InMemoryUgcStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access for in-memory aggregation
    pub async fn read(&self) -> RwLockReadGuard<'_, UgcData> {
        self.data.read().await
    }
}

#[async_trait]
impl BookmarkStore for InMemoryUgcStore {
    async fn add_bookmark(&self, user_id: &str, movie_id: &str) -> Result<()> {
        let mut data = self.data.write().await;
        if !data
            .bookmarks
            .iter()
            .any(|b| b.user_id == user_id && b.movie_id == movie_id)
        {
            data.bookmarks.push(BookmarkDoc::new(user_id, movie_id));
        }
        Ok(())
    }

    async fn remove_bookmark(&self, user_id: &str, movie_id: &str) -> Result<bool> {
        let mut data = self.data.write().await;
        let before = data.bookmarks.len();
        data.bookmarks
            .retain(|b| !(b.user_id == user_id && b.movie_id == movie_id));
        Ok(data.bookmarks.len() < before)
    }
}

#[async_trait]
impl LikeStore for InMemoryUgcStore {
    async fn add_like(&self, user_id: &str, target_id: &str, target: LikeTarget) -> Result<()> {
        let mut data = self.data.write().await;
        if !data.has_like(user_id, target_id, target) {
            data.likes.push(LikeDoc::new(user_id, target_id, target));
        }
        Ok(())
    }

    async fn remove_like(
        &self,
        user_id: &str,
        target_id: &str,
        target: LikeTarget,
    ) -> Result<bool> {
        let mut data = self.data.write().await;
        let before = data.likes.len();
        data.likes.retain(|l| {
            !(l.user_id == user_id && l.target_id == target_id && l.target_type == target)
        });
        Ok(data.likes.len() < before)
    }

    async fn like_stats(
        &self,
        user_id: &str,
        target_id: &str,
        target: LikeTarget,
    ) -> Result<LikeStats> {
        let data = self.data.read().await;
        Ok(LikeStats {
            target_id: target_id.to_string(),
            target_type: target,
            likes_count: data.like_count(target_id, target),
            user_liked: data.has_like(user_id, target_id, target),
        })
    }
}

#[async_trait]
impl ReviewStore for InMemoryUgcStore {
    async fn insert_review(&self, mut review: ReviewDoc) -> Result<ReviewDoc> {
        review.id = Some(ObjectId::new());
        review.metadata = Metadata::new();
        self.data.write().await.reviews.push(review.clone());
        Ok(review)
    }

    async fn find_review(&self, id: &ObjectId) -> Result<Option<ReviewDoc>> {
        let data = self.data.read().await;
        Ok(data.reviews.iter().find(|r| r.id.as_ref() == Some(id)).cloned())
    }

    async fn movie_reviews(&self, movie_id: &str) -> Result<Vec<ReviewDoc>> {
        let data = self.data.read().await;
        Ok(data
            .reviews
            .iter()
            .filter(|r| r.movie_id == movie_id)
            .cloned()
            .collect())
    }

    async fn update_review_text(&self, id: &ObjectId, text: &str) -> Result<()> {
        let mut data = self.data.write().await;
        if let Some(review) = data.reviews.iter_mut().find(|r| r.id.as_ref() == Some(id)) {
            review.review = text.to_string();
            review.metadata.updated_at = Some(bson::DateTime::now());
        }
        Ok(())
    }

    async fn delete_review(&self, id: &ObjectId) -> Result<bool> {
        let mut data = self.data.write().await;
        let before = data.reviews.len();
        data.reviews.retain(|r| r.id.as_ref() != Some(id));
        Ok(data.reviews.len() < before)
    }
}

#[async_trait]
impl WatchProgressStore for InMemoryUgcStore {
    async fn upsert_progress(&self, user_id: &str, movie_id: &str, progress: f64) -> Result<()> {
        let mut data = self.data.write().await;
        match data
            .progress
            .iter_mut()
            .find(|p| p.user_id == user_id && p.movie_id == movie_id)
        {
            Some(existing) => {
                existing.progress = progress;
                existing.metadata.updated_at = Some(bson::DateTime::now());
            }
            None => data.progress.push(WatchProgressDoc {
                metadata: Metadata::new(),
                user_id: user_id.to_string(),
                movie_id: movie_id.to_string(),
                progress,
            }),
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryUgcStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileDoc>> {
        Ok(self.data.read().await.profiles.get(user_id).cloned())
    }

    async fn upsert_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<ProfileDoc> {
        let mut data = self.data.write().await;
        let profile = data
            .profiles
            .entry(user_id.to_string())
            .or_insert_with(|| ProfileDoc {
                metadata: Metadata::new(),
                user_id: user_id.to_string(),
                ..Default::default()
            });
        update.apply(profile);
        Ok(profile.clone())
    }
}
