use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{AppPaths, ConfigService, RuntimeConfig};
use crate::llm::{ModelProvider, OpenAiProvider};
use crate::rag::{AnswerPipeline, IngestPipeline};
use crate::scrape::fetch::{HttpPageFetcher, PageFetcher};
use crate::vector::{PineconeIndex, SqliteVectorIndex, VectorIndex};

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes.
///
/// Collaborator handles are constructed once here and passed into the
/// pipelines by reference, so every dependency of an operation is
/// explicit and substitutable.
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: RuntimeConfig,
    pub ingest: IngestPipeline,
    pub answer: AnswerPipeline,
}

impl AppState {
    /// Initializes the application state: paths, configuration, the
    /// model provider, the vector index backend, and both pipelines.
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new());
        let config_service = ConfigService::new(paths.clone());
        let config = config_service
            .runtime_config()
            .map_err(InitializationError::Config)?;

        let provider: Arc<dyn ModelProvider> = Arc::new(
            OpenAiProvider::new(&config.models).map_err(InitializationError::Provider)?,
        );

        let index: Arc<dyn VectorIndex> = match config.vector_index.provider.as_str() {
            "pinecone" => Arc::new(
                PineconeIndex::new(&config.vector_index).map_err(InitializationError::Index)?,
            ),
            "sqlite" => Arc::new(
                SqliteVectorIndex::new(paths.as_ref())
                    .await
                    .map_err(InitializationError::Index)?,
            ),
            other => {
                return Err(InitializationError::UnknownIndexProvider(other.to_string()));
            }
        };

        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(Duration::from_secs(
            config.fetch.timeout_secs,
        )));

        let ingest = IngestPipeline::new(
            fetcher,
            provider.clone(),
            index.clone(),
            config.chunking.clone(),
        );
        let answer = AnswerPipeline::new(provider, index, config.vector_index.top_k);

        Ok(Arc::new(AppState {
            paths,
            config,
            ingest,
            answer,
        }))
    }
}
