use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

/// Fetches page content for ingestion.
///
/// Best-effort contract: implementations never fail — any fetch problem
/// yields empty text, so an unreachable page behaves like an empty one.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_rendered_text(&self, url: &str) -> String;
}

/// Plain HTTP fetcher. Pages that require client-side rendering can be
/// served through a rendering proxy sitting behind the same contract.
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_rendered_text(&self, url: &str) -> String {
        let response = match self.client.get(url).send().await {
            Ok(res) => res,
            Err(err) => {
                tracing::warn!("Failed to fetch {}: {}", url, err);
                return String::new();
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Fetch of {} returned {}", url, response.status());
            return String::new();
        }

        match response.text().await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("Failed to read body of {}: {}", url, err);
                String::new()
            }
        }
    }
}
