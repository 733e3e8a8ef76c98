use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

const MAX_TEXT_CHARS: usize = 20_000;

#[derive(Debug, Deserialize)]
pub struct EmbeddingRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
    pub dimension: usize,
    pub generator: &'static str,
}

pub async fn generate_embedding(
    State(state): State<SharedState>,
    _user: AuthUser,
    Json(request): Json<EmbeddingRequest>,
) -> Result<Json<EmbeddingResponse>, ApiError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("text is required".into()));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "text must be at most {MAX_TEXT_CHARS} characters"
        )));
    }

    let embedder = state.embedder.clone();
    let owned = text.to_string();
    let embedding = tokio::task::spawn_blocking(move || embedder.generate(&owned))
        .await
        .map_err(|err| ApiError::Internal(format!("embedding task failed: {err}")))??;

    debug!(
        chars = text.chars().count(),
        dimension = embedding.len(),
        "generated embedding"
    );

    Ok(Json(EmbeddingResponse {
        dimension: embedding.len(),
        embedding,
        generator: state.embedder.name(),
    }))
}
