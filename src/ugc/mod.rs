//! UGC write path
//!
//! Each operation persists first and publishes an event describing the
//! change only once the store accepted it.

use bson::oid::ObjectId;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::broker::{publish, MessageBroker};
use crate::db::schemas::{LikeTarget, ProfileDoc, ProfileUpdate, ReviewDoc};
use crate::db::{LikeStats, UgcStores};
use crate::models::{MovieProgress, UgcEvent, UgcKey, User, WatchProgressEvent};
use crate::types::{ProfileError, Result};

fn parse_review_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| ProfileError::InvalidId(format!("Invalid review id: {}", id)))
}

fn require_text(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ProfileError::NotAcceptable("Review text must not be empty".into()));
    }
    Ok(text)
}

/// Write-side orchestration for every kind of UGC
#[derive(Clone)]
pub struct UgcService {
    stores: UgcStores,
    ugc_events: Arc<dyn MessageBroker>,
    progress_events: Arc<dyn MessageBroker>,
}

impl UgcService {
    pub fn new(
        stores: UgcStores,
        ugc_events: Arc<dyn MessageBroker>,
        progress_events: Arc<dyn MessageBroker>,
    ) -> Self {
        Self {
            stores,
            ugc_events,
            progress_events,
        }
    }

    async fn emit(&self, key: UgcKey, event: UgcEvent) -> Result<()> {
        publish(self.ugc_events.as_ref(), key.as_str(), &event).await
    }

    // ------------------------------------------------------------------
    // Bookmarks
    // ------------------------------------------------------------------

    pub async fn add_bookmark(&self, user_id: &str, movie_id: &str) -> Result<()> {
        self.stores.bookmarks.add_bookmark(user_id, movie_id).await?;
        self.emit(UgcKey::Bookmark, UgcEvent::new(user_id, movie_id, true))
            .await?;
        info!(user_id = user_id, movie_id = movie_id, "Bookmark added");
        Ok(())
    }

    /// Returns whether a bookmark was actually removed
    pub async fn remove_bookmark(&self, user_id: &str, movie_id: &str) -> Result<bool> {
        let removed = self.stores.bookmarks.remove_bookmark(user_id, movie_id).await?;
        self.emit(UgcKey::Bookmark, UgcEvent::new(user_id, movie_id, false))
            .await?;
        info!(user_id = user_id, movie_id = movie_id, removed, "Bookmark removed");
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Likes
    // ------------------------------------------------------------------

    pub async fn add_like(&self, user_id: &str, target_id: &str, target: LikeTarget) -> Result<()> {
        if target == LikeTarget::Review {
            let id = parse_review_id(target_id)?;
            if self.stores.reviews.find_review(&id).await?.is_none() {
                return Err(ProfileError::NotFound(format!("Review {} not found", target_id)));
            }
        }

        self.stores.likes.add_like(user_id, target_id, target).await?;
        let event = UgcEvent::new(user_id, target_id, true).with_additional(json!(target.as_str()));
        self.emit(UgcKey::Like, event).await?;
        info!(user_id = user_id, target_id = target_id, %target, "Like added");
        Ok(())
    }

    pub async fn remove_like(
        &self,
        user_id: &str,
        target_id: &str,
        target: LikeTarget,
    ) -> Result<bool> {
        let removed = self.stores.likes.remove_like(user_id, target_id, target).await?;
        let event = UgcEvent::new(user_id, target_id, false).with_additional(json!(target.as_str()));
        self.emit(UgcKey::Like, event).await?;
        info!(user_id = user_id, target_id = target_id, %target, removed, "Like removed");
        Ok(removed)
    }

    pub async fn like_stats(
        &self,
        user_id: &str,
        target_id: &str,
        target: LikeTarget,
    ) -> Result<LikeStats> {
        self.stores.likes.like_stats(user_id, target_id, target).await
    }

    // ------------------------------------------------------------------
    // Reviews
    // ------------------------------------------------------------------

    pub async fn add_review(&self, user_id: &str, movie_id: &str, text: &str) -> Result<ReviewDoc> {
        let text = require_text(text)?;
        let review = self
            .stores
            .reviews
            .insert_review(ReviewDoc::new(user_id, movie_id, text))
            .await?;

        let event = UgcEvent::new(user_id, review.id_hex(), true).with_additional(json!(text));
        self.emit(UgcKey::Review, event).await?;

        info!(user_id = user_id, movie_id = movie_id, review_id = %review.id_hex(), "Review added");
        Ok(review)
    }

    pub async fn movie_reviews(&self, movie_id: &str) -> Result<Vec<ReviewDoc>> {
        self.stores.reviews.movie_reviews(movie_id).await
    }

    /// Load a review and check the caller wrote it
    async fn authored_review(&self, user_id: &str, review_id: &str) -> Result<(ObjectId, ReviewDoc)> {
        let id = parse_review_id(review_id)?;
        let review = self
            .stores
            .reviews
            .find_review(&id)
            .await?
            .ok_or_else(|| ProfileError::NotFound(format!("Review {} not found", review_id)))?;

        if review.user_id != user_id {
            return Err(ProfileError::Forbidden(
                "You are not the author of this review".into(),
            ));
        }
        Ok((id, review))
    }

    pub async fn update_review(
        &self,
        user_id: &str,
        review_id: &str,
        text: &str,
    ) -> Result<ReviewDoc> {
        let text = require_text(text)?;
        let (id, mut review) = self.authored_review(user_id, review_id).await?;

        self.stores.reviews.update_review_text(&id, text).await?;
        review.review = text.to_string();

        let event = UgcEvent::new(user_id, review_id, true).with_additional(json!(text));
        self.emit(UgcKey::Review, event).await?;

        info!(user_id = user_id, review_id = review_id, "Review updated");
        Ok(review)
    }

    pub async fn remove_review(&self, user_id: &str, review_id: &str) -> Result<()> {
        let (id, _) = self.authored_review(user_id, review_id).await?;

        self.stores.reviews.delete_review(&id).await?;

        self.emit(UgcKey::Review, UgcEvent::new(user_id, review_id, false))
            .await?;

        info!(user_id = user_id, review_id = review_id, "Review removed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Watch progress
    // ------------------------------------------------------------------

    pub async fn save_progress(&self, user: &User, progress: MovieProgress) -> Result<f64> {
        progress.validate()?;
        let fraction = progress.fraction();

        self.stores
            .progress
            .upsert_progress(&user.id, &progress.movie_id, fraction)
            .await?;

        let event = WatchProgressEvent {
            movie: progress,
            user: user.clone(),
        };
        publish(self.progress_events.as_ref(), &event.key(), &event).await?;

        Ok(fraction)
    }

    // ------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------

    /// Stored profile, or one seeded from the auth service's view of the user
    pub async fn get_profile(&self, user: &User) -> Result<ProfileDoc> {
        Ok(self
            .stores
            .profiles
            .get_profile(&user.id)
            .await?
            .unwrap_or_else(|| ProfileDoc {
                user_id: user.id.clone(),
                username: user.username.clone(),
                email: user.email.clone(),
                full_name: match (&user.first_name, &user.last_name) {
                    (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
                    (Some(name), None) | (None, Some(name)) => Some(name.clone()),
                    (None, None) => None,
                },
                ..Default::default()
            }))
    }

    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<ProfileDoc> {
        if update.is_empty() {
            return Err(ProfileError::BadRequest("No profile fields to update".into()));
        }

        let profile = self.stores.profiles.upsert_profile(user_id, &update).await?;

        let changes = serde_json::to_value(&update)
            .map_err(|e| ProfileError::Internal(format!("Event encode failed: {}", e)))?;
        self.emit(
            UgcKey::Profile,
            UgcEvent::new(user_id, user_id, true).with_additional(changes),
        )
        .await?;

        info!(user_id = user_id, "Profile updated");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{BookmarkStore, InMemoryUgcStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Broker keeping every event it was given
    #[derive(Default)]
    struct RecordingBroker {
        sent: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl RecordingBroker {
        fn sent(&self) -> Vec<(String, serde_json::Value)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageBroker for RecordingBroker {
        async fn send(&self, key: &str, event: serde_json::Value) -> Result<()> {
            self.sent.lock().unwrap().push((key.to_string(), event));
            Ok(())
        }

        fn subject(&self) -> &str {
            "test"
        }
    }

    /// Bookmark store whose writes always fail
    struct BrokenBookmarks;

    #[async_trait]
    impl BookmarkStore for BrokenBookmarks {
        async fn add_bookmark(&self, _user_id: &str, _movie_id: &str) -> Result<()> {
            Err(ProfileError::Database("connection reset".into()))
        }

        async fn remove_bookmark(&self, _user_id: &str, _movie_id: &str) -> Result<bool> {
            Err(ProfileError::Database("connection reset".into()))
        }
    }

    struct Fixture {
        service: UgcService,
        ugc: Arc<RecordingBroker>,
        progress: Arc<RecordingBroker>,
    }

    fn fixture() -> Fixture {
        let stores = UgcStores::in_memory(Arc::new(InMemoryUgcStore::new()));
        fixture_with(stores)
    }

    fn fixture_with(stores: UgcStores) -> Fixture {
        let ugc = Arc::new(RecordingBroker::default());
        let progress = Arc::new(RecordingBroker::default());
        Fixture {
            service: UgcService::new(stores, ugc.clone(), progress.clone()),
            ugc,
            progress,
        }
    }

    #[tokio::test]
    async fn test_bookmark_publishes_after_persisting() {
        let f = fixture();
        f.service.add_bookmark("u1", "m1").await.unwrap();
        assert!(f.service.remove_bookmark("u1", "m1").await.unwrap());

        let sent = f.ugc.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "bookmark");
        assert_eq!(sent[0].1["is_adding"], true);
        assert_eq!(sent[0].1["target_id"], "m1");
        assert_eq!(sent[1].1["is_adding"], false);
    }

    #[tokio::test]
    async fn test_failed_write_publishes_nothing() {
        let mut stores = UgcStores::in_memory(Arc::new(InMemoryUgcStore::new()));
        stores.bookmarks = Arc::new(BrokenBookmarks);
        let f = fixture_with(stores);

        let err = f.service.add_bookmark("u1", "m1").await.unwrap_err();
        assert!(matches!(err, ProfileError::Database(_)));
        assert!(f.ugc.sent().is_empty());
    }

    #[tokio::test]
    async fn test_like_keys_by_target() {
        let f = fixture();
        f.service.add_like("u1", "m1", LikeTarget::Movie).await.unwrap();

        let review = f.service.add_review("u2", "m1", "Great").await.unwrap();
        f.service
            .add_like("u1", &review.id_hex(), LikeTarget::Review)
            .await
            .unwrap();

        let sent = f.ugc.sent();
        let keys: Vec<&str> = sent.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["like", "review", "like"]);
        assert_eq!(sent[0].1["additional"], "movie");
        assert_eq!(sent[2].1["additional"], "review");

        let stats = f
            .service
            .like_stats("u1", &review.id_hex(), LikeTarget::Review)
            .await
            .unwrap();
        assert_eq!(stats.likes_count, 1);
        assert!(stats.user_liked);
    }

    #[tokio::test]
    async fn test_like_on_missing_review_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .add_like("u1", &ObjectId::new().to_hex(), LikeTarget::Review)
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::NotFound(_)));
        assert!(f.ugc.sent().is_empty());
    }

    #[tokio::test]
    async fn test_empty_review_not_acceptable() {
        let f = fixture();
        let err = f.service.add_review("u1", "m1", "   ").await.unwrap_err();
        assert!(matches!(err, ProfileError::NotAcceptable(_)));
        assert!(f.ugc.sent().is_empty());
    }

    #[tokio::test]
    async fn test_review_event_targets_review_id() {
        let f = fixture();
        let review = f.service.add_review("u1", "m1", "Tense").await.unwrap();

        let sent = f.ugc.sent();
        assert_eq!(sent[0].1["target_id"], review.id_hex().as_str());
        assert_eq!(sent[0].1["additional"], "Tense");
    }

    #[tokio::test]
    async fn test_only_author_may_edit_or_delete() {
        let f = fixture();
        let review = f.service.add_review("u1", "m1", "Tense").await.unwrap();
        let id = review.id_hex();

        let err = f.service.update_review("u2", &id, "Meh").await.unwrap_err();
        assert!(matches!(err, ProfileError::Forbidden(_)));

        let err = f.service.remove_review("u2", &id).await.unwrap_err();
        assert!(matches!(err, ProfileError::Forbidden(_)));

        let updated = f.service.update_review("u1", &id, "Tense!").await.unwrap();
        assert_eq!(updated.review, "Tense!");

        f.service.remove_review("u1", &id).await.unwrap();
        assert!(f.service.movie_reviews("m1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_review_id_errors() {
        let f = fixture();
        let err = f.service.remove_review("u1", "not-an-id").await.unwrap_err();
        assert!(matches!(err, ProfileError::InvalidId(_)));

        let err = f
            .service
            .remove_review("u1", &ObjectId::new().to_hex())
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_progress_stores_fraction_and_publishes() {
        let f = fixture();
        let user = User::with_id("u1");
        let fraction = f
            .service
            .save_progress(
                &user,
                MovieProgress {
                    movie_id: "m1".into(),
                    title: "Heat".into(),
                    current_progress: 45.0,
                    seconds_length: 90.0,
                },
            )
            .await
            .unwrap();
        assert_eq!(fraction, 0.5);

        let sent = f.progress.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "m1+u1");
        assert_eq!(sent[0].1["movie"]["id"], "m1");
        assert_eq!(sent[0].1["movie"]["title"], "Heat");
        assert_eq!(sent[0].1["user"]["id"], "u1");
        assert!(f.ugc.sent().is_empty());
    }

    #[tokio::test]
    async fn test_progress_out_of_range_rejected() {
        let f = fixture();
        let err = f
            .service
            .save_progress(
                &User::with_id("u1"),
                MovieProgress {
                    movie_id: "m1".into(),
                    title: "Heat".into(),
                    current_progress: 120.0,
                    seconds_length: 90.0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::BadRequest(_)));
        assert!(f.progress.sent().is_empty());
    }

    #[tokio::test]
    async fn test_profile_seeded_then_updated() {
        let f = fixture();
        let user = User {
            id: "u1".into(),
            username: Some("ada".into()),
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            ..Default::default()
        };

        let profile = f.service.get_profile(&user).await.unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Ada Lovelace"));

        let update = ProfileUpdate {
            email: Some("ada@example.com".into()),
            ..Default::default()
        };
        let profile = f.service.update_profile("u1", update).await.unwrap();
        assert_eq!(profile.email.as_deref(), Some("ada@example.com"));

        let sent = f.ugc.sent();
        assert_eq!(sent[0].0, "profile");
        assert_eq!(sent[0].1["additional"]["email"], "ada@example.com");

        let err = f
            .service
            .update_profile("u1", ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::BadRequest(_)));
    }
}
