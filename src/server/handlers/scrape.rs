use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

/// `POST /api/scrape` — ingest one document URL.
///
/// All ingestion failures collapse to a single generic error; the
/// caller cannot distinguish which pipeline step failed. Detail goes to
/// the log only.
pub async fn scrape(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ScrapeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let url = payload.url.trim();
    if url.is_empty() {
        return Err(ApiError::BadRequest("url must not be empty".to_string()));
    }

    tracing::info!("Scraping {}", url);

    match state.ingest.ingest(url).await {
        Ok(report) => {
            tracing::info!("Stored {} chunks for {}", report.chunks_indexed, url);
            Ok(Json(json!({
                "success": true,
                "message": "Embeddings stored successfully."
            })))
        }
        Err(err) => {
            tracing::error!("Ingestion of {} failed: {}", url, err);
            Err(ApiError::Internal("Failed to process the URL.".to_string()))
        }
    }
}
