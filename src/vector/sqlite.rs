//! SQLite-backed vector index.
//!
//! In-process store using SQLite for persistence and brute-force cosine
//! similarity for ranking. Default backend when no remote index is
//! configured, and the backend used by the unit tests.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{IndexedRecord, ScoredText, VectorIndex};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub struct SqliteVectorIndex {
    pool: SqlitePool,
}

impl SqliteVectorIndex {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.index_db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS index_records (
                record_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT ''
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn upsert(&self, record: IndexedRecord, embedding: Vec<f32>) -> Result<(), ApiError> {
        let blob = Self::serialize_embedding(&embedding);

        sqlx::query(
            "INSERT OR REPLACE INTO index_records (record_id, content, source, embedding, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&record.id)
        .bind(&record.text)
        .bind(&record.source)
        .bind(&blob)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredText>, ApiError> {
        let rows = sqlx::query("SELECT content, embedding FROM index_records")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let mut scored: Vec<ScoredText> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(embedding, &stored);

                Some(ScoredText {
                    text: row.get("content"),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k.max(1));

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM index_records")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_index() -> (SqliteVectorIndex, TempDir) {
        let dir = TempDir::new().unwrap();
        let index = SqliteVectorIndex::with_path(dir.path().join("index.db"))
            .await
            .unwrap();
        (index, dir)
    }

    #[tokio::test]
    async fn upsert_and_query_ranks_by_similarity() {
        let (index, _dir) = test_index().await;

        index
            .upsert(IndexedRecord::new("about cats", "doc"), vec![1.0, 0.0])
            .await
            .unwrap();
        index
            .upsert(IndexedRecord::new("about dogs", "doc"), vec![0.0, 1.0])
            .await
            .unwrap();
        index
            .upsert(
                IndexedRecord::new("about pets", "doc"),
                vec![0.707, 0.707],
            )
            .await
            .unwrap();

        let results = index.query(&[1.0, 0.0], 10).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].text, "about cats");
        assert_eq!(results[1].text, "about pets");
        assert_eq!(results[2].text, "about dogs");
        assert!(results[0].score > results[1].score);
        assert!(results[1].score > results[2].score);
    }

    #[tokio::test]
    async fn query_truncates_to_top_k() {
        let (index, _dir) = test_index().await;

        for i in 0..5 {
            index
                .upsert(
                    IndexedRecord::new(format!("chunk {}", i), "doc"),
                    vec![1.0, i as f32],
                )
                .await
                .unwrap();
        }

        let results = index.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn reingestion_appends_rather_than_deduplicates() {
        let (index, _dir) = test_index().await;

        index
            .upsert(
                IndexedRecord::new("same text", "https://example.com"),
                vec![1.0],
            )
            .await
            .unwrap();
        let before = index.count().await.unwrap();

        // Fresh record id each time, so identical content accumulates.
        index
            .upsert(
                IndexedRecord::new("same text", "https://example.com"),
                vec![1.0],
            )
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), before + 1);
    }
}
