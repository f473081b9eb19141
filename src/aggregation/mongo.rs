//! MongoDB runners for the aggregation pipelines

use async_trait::async_trait;
use bson::Document;
use tracing::debug;

use super::{pipeline, DetailedAggregator, MovieDetailStats, MovieStats, SummaryAggregator, SummaryKind};
use crate::db::{MongoClient, Page};
use crate::types::{ProfileError, Result};

fn decode<T: serde::de::DeserializeOwned>(rows: Vec<Document>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| bson::from_document(row).map_err(ProfileError::from))
        .collect()
}

/// Runs one kind of summary pipeline
#[derive(Clone)]
pub struct MongoSummaryAggregator {
    client: MongoClient,
    kind: SummaryKind,
}

impl MongoSummaryAggregator {
    pub fn new(client: MongoClient, kind: SummaryKind) -> Self {
        Self { client, kind }
    }
}

#[async_trait]
impl SummaryAggregator for MongoSummaryAggregator {
    fn kind(&self) -> SummaryKind {
        self.kind
    }

    async fn summarize(&self, user_id: &str, page: Page) -> Result<Vec<MovieStats>> {
        let stages = pipeline::summary(self.kind, user_id, page);
        let rows = self.client.aggregate(self.kind.collection(), stages).await?;
        debug!(kind = %self.kind, user_id = user_id, rows = rows.len(), "Summary aggregated");
        decode(rows)
    }
}

/// Runs the collectionless detailed pipeline
#[derive(Clone)]
pub struct MongoDetailedAggregator {
    client: MongoClient,
}

impl MongoDetailedAggregator {
    pub fn new(client: MongoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DetailedAggregator for MongoDetailedAggregator {
    async fn detail(&self, user_id: &str, movie_id: &str) -> Result<MovieDetailStats> {
        let rows = self
            .client
            .aggregate_documents(pipeline::detailed(user_id, movie_id))
            .await?;

        decode::<MovieDetailStats>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| ProfileError::Database(format!("No aggregate row for movie {}", movie_id)))
    }
}
