use thiserror::Error;

use crate::core::errors::ApiError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(ApiError),
    #[error("Failed to initialize model provider: {0}")]
    Provider(ApiError),
    #[error("Failed to initialize vector index: {0}")]
    Index(ApiError),
    #[error("Unknown vector index provider: {0}")]
    UnknownIndexProvider(String),
}
