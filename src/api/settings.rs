use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Runtime configuration with secrets redacted
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub provider: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub has_api_key: bool,
    pub vector_backend: &'static str,
    pub qdrant_url: String,
    pub qdrant_collection: String,
    pub has_qdrant_api_key: bool,
    pub book_count: usize,
}

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let config = &state.config;
    Json(ConfigResponse {
        provider: config.llm.provider.clone(),
        base_url: config.llm.base_url.clone(),
        chat_model: config.llm.chat_model.clone(),
        embedding_model: config.llm.embedding_model.clone(),
        embedding_dim: config.llm.embedding_dim,
        has_api_key: config.llm.api_key.is_some(),
        vector_backend: if config.vectors_path.is_some() {
            "memory"
        } else {
            "qdrant"
        },
        qdrant_url: config.qdrant.url.clone(),
        qdrant_collection: config.qdrant.collection.clone(),
        has_qdrant_api_key: config.qdrant.api_key.is_some(),
        book_count: state.corpus.book_count(),
    })
}
