//! Per-entity store traits
//!
//! Handlers depend on these traits; MongoDB collections implement them
//! directly and `InMemoryUgcStore` backs dev mode and tests.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use serde::Serialize;
use tracing::debug;

use crate::db::mongo::{is_duplicate_key, MongoCollection};
use crate::db::schemas::{
    BookmarkDoc, LikeDoc, LikeTarget, ProfileDoc, ProfileUpdate, ReviewDoc, WatchProgressDoc,
};
use crate::types::{ProfileError, Result};

/// Like count on one target plus whether the caller is among the likers
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LikeStats {
    pub target_id: String,
    pub target_type: LikeTarget,
    pub likes_count: u64,
    pub user_liked: bool,
}

#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Save a bookmark; saving an existing one succeeds
    async fn add_bookmark(&self, user_id: &str, movie_id: &str) -> Result<()>;

    /// Remove a bookmark; false when there was none
    async fn remove_bookmark(&self, user_id: &str, movie_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait LikeStore: Send + Sync {
    async fn add_like(&self, user_id: &str, target_id: &str, target: LikeTarget) -> Result<()>;

    async fn remove_like(&self, user_id: &str, target_id: &str, target: LikeTarget)
        -> Result<bool>;

    async fn like_stats(&self, user_id: &str, target_id: &str, target: LikeTarget)
        -> Result<LikeStats>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Store a new review and return it with its assigned id
    async fn insert_review(&self, review: ReviewDoc) -> Result<ReviewDoc>;

    async fn find_review(&self, id: &ObjectId) -> Result<Option<ReviewDoc>>;

    async fn movie_reviews(&self, movie_id: &str) -> Result<Vec<ReviewDoc>>;

    async fn update_review_text(&self, id: &ObjectId, text: &str) -> Result<()>;

    async fn delete_review(&self, id: &ObjectId) -> Result<bool>;
}

#[async_trait]
pub trait WatchProgressStore: Send + Sync {
    /// Insert or overwrite the user's progress on a movie
    async fn upsert_progress(&self, user_id: &str, movie_id: &str, progress: f64) -> Result<()>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileDoc>>;

    /// Apply a partial edit, creating the profile if needed
    async fn upsert_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<ProfileDoc>;
}

#[async_trait]
impl BookmarkStore for MongoCollection<BookmarkDoc> {
    async fn add_bookmark(&self, user_id: &str, movie_id: &str) -> Result<()> {
        match self.inner().insert_one(BookmarkDoc::new(user_id, movie_id)).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                debug!(user_id, movie_id, "Bookmark already exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_bookmark(&self, user_id: &str, movie_id: &str) -> Result<bool> {
        self.delete_one(doc! { "user_id": user_id, "movie_id": movie_id })
            .await
    }
}

#[async_trait]
impl LikeStore for MongoCollection<LikeDoc> {
    async fn add_like(&self, user_id: &str, target_id: &str, target: LikeTarget) -> Result<()> {
        match self
            .inner()
            .insert_one(LikeDoc::new(user_id, target_id, target))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                debug!(user_id, target_id, %target, "Like already exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_like(
        &self,
        user_id: &str,
        target_id: &str,
        target: LikeTarget,
    ) -> Result<bool> {
        self.delete_one(doc! {
            "user_id": user_id,
            "target_id": target_id,
            "target_type": target.as_str(),
        })
        .await
    }

    async fn like_stats(
        &self,
        user_id: &str,
        target_id: &str,
        target: LikeTarget,
    ) -> Result<LikeStats> {
        let likes_count = self
            .count(doc! { "target_id": target_id, "target_type": target.as_str() })
            .await?;

        let user_liked = likes_count > 0
            && self
                .find_one(doc! {
                    "user_id": user_id,
                    "target_id": target_id,
                    "target_type": target.as_str(),
                })
                .await?
                .is_some();

        Ok(LikeStats {
            target_id: target_id.to_string(),
            target_type: target,
            likes_count,
            user_liked,
        })
    }
}

#[async_trait]
impl ReviewStore for MongoCollection<ReviewDoc> {
    async fn insert_review(&self, mut review: ReviewDoc) -> Result<ReviewDoc> {
        let id = self.insert_one(review.clone()).await?;
        review.id = Some(id);
        Ok(review)
    }

    async fn find_review(&self, id: &ObjectId) -> Result<Option<ReviewDoc>> {
        self.find_one(doc! { "_id": id }).await
    }

    async fn movie_reviews(&self, movie_id: &str) -> Result<Vec<ReviewDoc>> {
        self.find_many(doc! { "movie_id": movie_id }, None).await
    }

    async fn update_review_text(&self, id: &ObjectId, text: &str) -> Result<()> {
        self.update_one(doc! { "_id": id }, doc! { "$set": { "review": text } }, false)
            .await?;
        Ok(())
    }

    async fn delete_review(&self, id: &ObjectId) -> Result<bool> {
        self.delete_one(doc! { "_id": id }).await
    }
}

#[async_trait]
impl WatchProgressStore for MongoCollection<WatchProgressDoc> {
    async fn upsert_progress(&self, user_id: &str, movie_id: &str, progress: f64) -> Result<()> {
        self.update_one(
            doc! { "user_id": user_id, "movie_id": movie_id },
            doc! { "$set": { "progress": progress } },
            true,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MongoCollection<ProfileDoc> {
    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileDoc>> {
        self.find_one(doc! { "user_id": user_id }).await
    }

    async fn upsert_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<ProfileDoc> {
        self.update_one(
            doc! { "user_id": user_id },
            doc! { "$set": update.to_set_document() },
            true,
        )
        .await?;

        self.get_profile(user_id)
            .await?
            .ok_or_else(|| ProfileError::Database(format!("Profile {} vanished after upsert", user_id)))
    }
}
