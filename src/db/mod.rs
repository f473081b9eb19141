//! MongoDB persistence layer

pub mod memory;
pub mod mongo;
pub mod schemas;
pub mod stores;

use std::sync::Arc;

pub use memory::InMemoryUgcStore;
pub use mongo::{MongoClient, MongoCollection, Page};
pub use stores::{BookmarkStore, LikeStats, LikeStore, ProfileStore, ReviewStore, WatchProgressStore};

use schemas::{
    BookmarkDoc, LikeDoc, ProfileDoc, ReviewDoc, WatchProgressDoc, BOOKMARK_COLLECTION,
    LIKE_COLLECTION, PROFILE_COLLECTION, REVIEW_COLLECTION, WATCH_PROGRESS_COLLECTION,
};

use crate::types::Result;

/// Every store the write path needs
#[derive(Clone)]
pub struct UgcStores {
    pub bookmarks: Arc<dyn BookmarkStore>,
    pub likes: Arc<dyn LikeStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub progress: Arc<dyn WatchProgressStore>,
    pub profiles: Arc<dyn ProfileStore>,
}

impl UgcStores {
    /// Open all collections, creating their indexes
    pub async fn mongo(client: &MongoClient) -> Result<Self> {
        let bookmarks: MongoCollection<BookmarkDoc> = client.collection(BOOKMARK_COLLECTION).await?;
        let likes: MongoCollection<LikeDoc> = client.collection(LIKE_COLLECTION).await?;
        let reviews: MongoCollection<ReviewDoc> = client.collection(REVIEW_COLLECTION).await?;
        let progress: MongoCollection<WatchProgressDoc> =
            client.collection(WATCH_PROGRESS_COLLECTION).await?;
        let profiles: MongoCollection<ProfileDoc> = client.collection(PROFILE_COLLECTION).await?;

        Ok(Self {
            bookmarks: Arc::new(bookmarks),
            likes: Arc::new(likes),
            reviews: Arc::new(reviews),
            progress: Arc::new(progress),
            profiles: Arc::new(profiles),
        })
    }

    /// Back every store with one in-process store
    pub fn in_memory(store: Arc<InMemoryUgcStore>) -> Self {
        Self {
            bookmarks: store.clone(),
            likes: store.clone(),
            reviews: store.clone(),
            progress: store.clone(),
            profiles: store,
        }
    }
}
