use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::llm::ChatMessage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// `POST /api/chat` — answer a query as a streamed body.
///
/// Fragments are forwarded as soon as the model emits them; there is no
/// framing and connection close marks end-of-answer. A failure before
/// the stream starts surfaces as a JSON error response instead, which
/// keeps the two outcomes distinguishable for the client.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let query = payload.query.trim().to_string();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }

    let rx = state
        .answer
        .answer(&query, &payload.messages)
        .await
        .map_err(|err| {
            tracing::error!("Answer pipeline failed before streaming: {}", err);
            err
        })?;

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(stream))
        .map_err(ApiError::internal)
}
