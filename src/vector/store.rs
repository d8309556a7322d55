//! VectorIndex trait — abstract interface for similarity-search backends.
//!
//! The ingestion pipeline writes (embedding, chunk text) records; the
//! answer pipeline reads back the top-K most similar texts. Records are
//! never updated or deleted, and repeated ingestion of the same source
//! appends new records rather than deduplicating.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::ApiError;

/// A chunk of document text persisted alongside its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedRecord {
    /// Unique record identifier.
    pub id: String,
    /// The chunk text, stored as retrievable metadata.
    pub text: String,
    /// Source URL the chunk was ingested from.
    pub source: String,
    /// RFC3339 ingestion timestamp.
    pub created_at: String,
}

impl IndexedRecord {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            source: source.into(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// One similarity-search match, most-similar first in result order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredText {
    pub text: String,
    pub score: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Persist a record with its embedding vector.
    async fn upsert(&self, record: IndexedRecord, embedding: Vec<f32>) -> Result<(), ApiError>;

    /// Retrieve up to `top_k` stored texts ranked by similarity to the
    /// query embedding, best match first.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredText>, ApiError>;

    /// Total number of stored records.
    async fn count(&self) -> Result<usize, ApiError>;
}
