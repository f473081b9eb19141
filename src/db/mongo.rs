//! MongoDB client and collection wrapper

use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::{StreamExt, TryStreamExt};
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, Database, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::{ProfileError, Result};

/// Server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// Skip/limit paging over a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
}

impl Page {
    pub fn new(number: u64, size: u64) -> Self {
        Self { number, size }
    }

    pub fn skip(&self) -> u64 {
        self.number.saturating_mul(self.size)
    }

    /// Signed skip for drivers and pipelines, saturating at `i64::MAX`
    pub fn skip_i64(&self) -> i64 {
        i64::try_from(self.skip()).unwrap_or(i64::MAX)
    }

    /// Signed limit, saturating at `i64::MAX`
    pub fn limit_i64(&self) -> i64 {
        i64::try_from(self.size).unwrap_or(i64::MAX)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { number: 0, size: 50 }
    }
}

/// Whether a driver error is a unique index violation
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and ping the database
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Fail fast instead of hanging on an unreachable server
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}/?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri.trim_end_matches('/'))
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| ProfileError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ProfileError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection, applying its indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    fn database(&self) -> Database {
        self.client.database(&self.db_name)
    }

    /// Run an aggregation pipeline over a collection
    pub async fn aggregate(&self, collection: &str, pipeline: Vec<Document>) -> Result<Vec<Document>> {
        let cursor = self
            .database()
            .collection::<Document>(collection)
            .aggregate(pipeline)
            .await
            .map_err(|e| ProfileError::Database(format!("Aggregate on {} failed: {}", collection, e)))?;

        Ok(cursor.try_collect().await?)
    }

    /// Run a collectionless aggregation (pipelines starting with `$documents`)
    pub async fn aggregate_documents(&self, pipeline: Vec<Document>) -> Result<Vec<Document>> {
        let cursor = self
            .database()
            .aggregate(pipeline)
            .await
            .map_err(|e| ProfileError::Database(format!("Aggregate failed: {}", e)))?;

        Ok(cursor.try_collect().await?)
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(client: &Client, db_name: &str, collection_name: &str) -> Result<Self> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<()> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| ProfileError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId> {
        let now = DateTime::now();
        let metadata = item.mut_metadata();
        metadata.created_at = Some(now);
        metadata.updated_at = Some(now);

        let result = self.inner.insert_one(item).await?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ProfileError::Database("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| ProfileError::Database(format!("Find failed: {}", e)))
    }

    /// Find documents by filter, optionally paged
    pub async fn find_many(&self, filter: Document, page: Option<Page>) -> Result<Vec<T>> {
        let mut find = self.inner.find(filter);
        if let Some(page) = page {
            find = find.skip(page.skip()).limit(page.limit_i64());
        }

        let cursor = find
            .await
            .map_err(|e| ProfileError::Database(format!("Find failed: {}", e)))?;

        let results: Vec<T> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(results)
    }

    /// Update one document, stamping `metadata.updated_at`
    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateResult> {
        let mut update = update;
        let now = DateTime::now();

        let mut set = update.get_document("$set").cloned().unwrap_or_default();
        set.insert("metadata.updated_at", now);
        update.insert("$set", set);

        if upsert {
            let mut on_insert = update.get_document("$setOnInsert").cloned().unwrap_or_default();
            on_insert.insert("metadata.created_at", now);
            update.insert("$setOnInsert", on_insert);
        }

        self.inner
            .update_one(filter, UpdateModifications::Document(update))
            .upsert(upsert)
            .await
            .map_err(|e| ProfileError::Database(format!("Update failed: {}", e)))
    }

    /// Delete one document; true when something was removed
    pub async fn delete_one(&self, filter: Document) -> Result<bool> {
        let result = self
            .inner
            .delete_one(filter)
            .await
            .map_err(|e| ProfileError::Database(format!("Delete failed: {}", e)))?;

        Ok(result.deleted_count > 0)
    }

    /// Count documents matching a filter
    pub async fn count(&self, filter: Document) -> Result<u64> {
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| ProfileError::Database(format!("Count failed: {}", e)))
    }

    /// Get the underlying collection for advanced operations
    pub fn inner(&self) -> &Collection<T> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_skip() {
        assert_eq!(Page::new(0, 50).skip(), 0);
        assert_eq!(Page::new(3, 20).skip(), 60);
        assert_eq!(Page::new(u64::MAX, 2).skip(), u64::MAX);
        assert_eq!(Page::new(u64::MAX / 2, 50).skip_i64(), i64::MAX);
        assert_eq!(Page::new(0, u64::MAX).limit_i64(), i64::MAX);
    }

    #[test]
    fn test_default_page() {
        assert_eq!(Page::default(), Page::new(0, 50));
    }
}
