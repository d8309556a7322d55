use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::ChatMessage;
use crate::core::errors::ApiError;

/// Incremental completion fragments, in generation order. The channel
/// closing is the only end-of-stream signal; an `Err` item terminates
/// the answer with a stream error.
pub type TokenStream = mpsc::Receiver<Result<String, ApiError>>;

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// provider name (e.g. "openai")
    fn name(&self) -> &str;

    /// generate one embedding per input text
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;

    /// chat completion (streaming)
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<TokenStream, ApiError>;
}
