//! Pinecone vector index client.
//!
//! Talks to a Pinecone serverless index over its REST data plane. The
//! chunk text travels in `metadata.text` and comes back with query
//! matches when `includeMetadata` is set.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{json, Value};

use super::store::{IndexedRecord, ScoredText, VectorIndex};
use crate::core::config::IndexConfig;
use crate::core::errors::ApiError;

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct PineconeIndex {
    client: Client,
    index_host: String,
}

impl PineconeIndex {
    pub fn new(config: &IndexConfig) -> Result<Self, ApiError> {
        if config.api_key.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Missing vector index API key (set PINECONE_API_KEY or vector_index.api_key)"
                    .to_string(),
            ));
        }
        let host = config.index_host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(ApiError::BadRequest(
                "Missing vector index host (set PINECONE_INDEX_HOST or vector_index.index_host)"
                    .to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(config.api_key.trim()).map_err(ApiError::internal)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            client,
            index_host: host.to_string(),
        })
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, record: IndexedRecord, embedding: Vec<f32>) -> Result<(), ApiError> {
        let url = format!("{}/vectors/upsert", self.index_host);
        let body = json!({
            "vectors": [{
                "id": record.id,
                "values": embedding,
                "metadata": {
                    "text": record.text,
                    "source": record.source,
                    "created_at": record.created_at,
                },
            }],
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Pinecone upsert failed ({}): {}",
                status, text
            )));
        }

        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredText>, ApiError> {
        let url = format!("{}/query", self.index_host);
        let body = json!({
            "vector": embedding,
            "topK": top_k,
            "includeMetadata": true,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Pinecone query failed ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        let matches = payload
            .get("matches")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut results = Vec::new();
        for item in matches {
            let text = item
                .get("metadata")
                .and_then(|m| m.get("text"))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let score = item.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
            if !text.is_empty() {
                results.push(ScoredText { text, score });
            }
        }

        Ok(results)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let url = format!("{}/describe_index_stats", self.index_host);
        let res = self
            .client
            .post(&url)
            .json(&json!({}))
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            return Err(ApiError::Internal(format!(
                "Pinecone stats request failed: {}",
                res.status()
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        let count = payload
            .get("totalVectorCount")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        Ok(count as usize)
    }
}
