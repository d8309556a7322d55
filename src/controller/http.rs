//! HTTP transport for the conversation controller.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::json;
use tokio::sync::mpsc;

use super::ChatService;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, TokenStream};

/// Talks to the two server endpoints. The chat response body is an
/// unframed UTF-8 byte stream; connection close is end-of-answer.
pub struct HttpChatService {
    client: Client,
    base_url: String,
}

impl HttpChatService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn ingest(&self, url: &str) -> Result<(), ApiError> {
        let res = self
            .client
            .post(format!("{}/api/scrape", self.base_url))
            .json(&json!({ "url": url }))
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            return Err(ApiError::Internal(format!(
                "Scrape request failed: {}",
                res.status()
            )));
        }

        Ok(())
    }

    async fn answer(
        &self,
        query: &str,
        history: &[ChatMessage],
    ) -> Result<TokenStream, ApiError> {
        let res = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&json!({ "query": query, "messages": history }))
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            return Err(ApiError::Internal(format!(
                "Chat request failed: {}",
                res.status()
            )));
        }

        let (tx, rx) = mpsc::channel(32);
        let mut stream = res.bytes_stream();

        tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(bytes) => {
                        let text = String::from_utf8_lossy(&bytes).to_string();
                        if !text.is_empty() && tx.send(Ok(text)).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(ApiError::internal(e))).await;
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}
