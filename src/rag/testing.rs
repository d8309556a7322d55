//! Scripted collaborator fakes for the pipeline tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::errors::ApiError;
use crate::llm::provider::{ModelProvider, TokenStream};
use crate::llm::types::ChatMessage;
use crate::scrape::fetch::PageFetcher;
use crate::vector::store::{IndexedRecord, ScoredText, VectorIndex};

/// Fetcher that always serves the same canned page body.
pub struct StaticFetcher(pub String);

impl StaticFetcher {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch_rendered_text(&self, _url: &str) -> String {
        self.0.clone()
    }
}

/// Provider returning unit embeddings and a scripted fragment sequence,
/// recording every chat request it receives.
pub struct FakeProvider {
    pub fail_embed: bool,
    pub fail_stream: bool,
    pub fragments: Vec<String>,
    pub chats: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeProvider {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fail_embed: false,
            fail_stream: false,
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            chats: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_embed() -> Self {
        Self {
            fail_embed: true,
            ..Self::new(&[])
        }
    }

    pub fn failing_stream(fragments: &[&str]) -> Self {
        Self {
            fail_stream: true,
            ..Self::new(fragments)
        }
    }

    pub fn last_chat(&self) -> Vec<ChatMessage> {
        self.chats
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no chat request recorded")
    }
}

#[async_trait]
impl ModelProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if self.fail_embed {
            return Err(ApiError::Internal("embedding backend down".to_string()));
        }
        Ok(inputs.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }

    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<TokenStream, ApiError> {
        self.chats.lock().unwrap().push(messages);

        let (tx, rx) = mpsc::channel(8);
        let fragments = self.fragments.clone();
        let fail = self.fail_stream;
        tokio::spawn(async move {
            for fragment in fragments {
                if tx.send(Ok(fragment)).await.is_err() {
                    return;
                }
            }
            if fail {
                let _ = tx
                    .send(Err(ApiError::Internal("stream interrupted".to_string())))
                    .await;
            }
        });

        Ok(rx)
    }
}

/// In-memory index with canned query results and a record of writes.
#[derive(Default)]
pub struct MemoryIndex {
    pub records: Mutex<Vec<(IndexedRecord, Vec<f32>)>>,
    pub canned: Vec<ScoredText>,
    pub last_top_k: Mutex<Option<usize>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(texts: &[&str]) -> Self {
        let canned = texts
            .iter()
            .enumerate()
            .map(|(i, text)| ScoredText {
                text: text.to_string(),
                score: 1.0 - i as f32 * 0.01,
            })
            .collect();
        Self {
            canned,
            ..Self::default()
        }
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, record: IndexedRecord, embedding: Vec<f32>) -> Result<(), ApiError> {
        self.records.lock().unwrap().push((record, embedding));
        Ok(())
    }

    async fn query(&self, _embedding: &[f32], top_k: usize) -> Result<Vec<ScoredText>, ApiError> {
        *self.last_top_k.lock().unwrap() = Some(top_k);
        let mut results = self.canned.clone();
        results.truncate(top_k);
        Ok(results)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        Ok(self.records.lock().unwrap().len())
    }
}
