//! Document ingestion pipeline: fetch, clean, chunk, embed, upsert.

use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::ModelProvider;
use crate::scrape::chunk::{split_text, ChunkingConfig};
use crate::scrape::clean::clean_html;
use crate::scrape::fetch::PageFetcher;
use crate::vector::{IndexedRecord, VectorIndex};

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub chunks_indexed: usize,
}

pub struct IngestPipeline {
    fetcher: Arc<dyn PageFetcher>,
    provider: Arc<dyn ModelProvider>,
    index: Arc<dyn VectorIndex>,
    chunking: ChunkingConfig,
}

impl IngestPipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        provider: Arc<dyn ModelProvider>,
        index: Arc<dyn VectorIndex>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            fetcher,
            provider,
            index,
            chunking,
        }
    }

    /// Runs the full ingestion sequence for one URL.
    ///
    /// A page that fetches to nothing (or cleans to nothing) is a
    /// vacuous success: zero records written, no error. Chunks are
    /// embedded and upserted one at a time; the first failure aborts
    /// the whole operation with no partial-success reporting.
    pub async fn ingest(&self, url: &str) -> Result<IngestReport, ApiError> {
        let raw = self.fetcher.fetch_rendered_text(url).await;
        let text = clean_html(&raw);
        let chunks = split_text(&text, &self.chunking);
        tracing::debug!("Split {} into {} chunks", url, chunks.len());

        let mut indexed = 0usize;
        for chunk in chunks {
            if chunk.trim().is_empty() {
                continue;
            }

            let mut vectors = self.provider.embed(std::slice::from_ref(&chunk)).await?;
            let embedding = vectors.pop().ok_or_else(|| {
                ApiError::Internal("Embedding API returned no vector".to_string())
            })?;

            self.index
                .upsert(IndexedRecord::new(chunk, url), embedding)
                .await?;
            indexed += 1;
        }

        tracing::info!("Indexed {} chunks from {}", indexed, url);
        Ok(IngestReport {
            chunks_indexed: indexed,
        })
    }
}
