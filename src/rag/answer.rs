//! Query-answering pipeline: embed, retrieve, prompt, stream.

use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ModelProvider, TokenStream};
use crate::vector::VectorIndex;

pub const SYSTEM_PROMPT: &str = "You're a highly knowledgeable research assistant, specialized in helping users extract and understand information from academic papers and technical documents. Always provide concise, accurate, and contextually relevant responses.";

pub struct AnswerPipeline {
    provider: Arc<dyn ModelProvider>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl AnswerPipeline {
    pub fn new(provider: Arc<dyn ModelProvider>, index: Arc<dyn VectorIndex>, top_k: usize) -> Self {
        Self {
            provider,
            index,
            top_k,
        }
    }

    /// Answers a query against the indexed documents as a token stream.
    ///
    /// The first fragment reaches the caller as soon as the model emits
    /// it; any failure before streaming begins is returned as an `Err`
    /// here, while mid-stream failures arrive as an `Err` item in the
    /// channel.
    pub async fn answer(
        &self,
        query: &str,
        history: &[ChatMessage],
    ) -> Result<TokenStream, ApiError> {
        let mut vectors = self.provider.embed(&[query.to_string()]).await?;
        let query_embedding = vectors
            .pop()
            .ok_or_else(|| ApiError::Internal("Embedding API returned no vector".to_string()))?;

        let matches = self.index.query(&query_embedding, self.top_k).await?;
        tracing::debug!("Retrieved {} chunks for query", matches.len());

        // Retrieval order is preserved as-is; the index already returns
        // matches similarity-descending.
        let context = matches
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let messages = build_messages(query, history, &context);
        self.provider.stream_chat(messages).await
    }
}

fn build_messages(query: &str, history: &[ChatMessage], context: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(format!(
        "Based on the following context, please address the user's query:\n\nContext: {}\n\nUser's Query: {}",
        context, query
    )));
    messages
}
