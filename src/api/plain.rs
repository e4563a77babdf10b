use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::models::{PlainSearchRequest, PlainSearchResponse};
use crate::state::AppState;

/// POST /search/plain - Semantic search without routing, optionally
/// restricted to one testament or one book. Every failure is a JSON
/// `{error, details?}` body.
pub async fn search_plain(
    State(state): State<AppState>,
    payload: Result<Json<PlainSearchRequest>, JsonRejection>,
) -> Result<Json<PlainSearchResponse>, (StatusCode, Json<Value>)> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!("Unreadable plain search body: {rejection}");
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Yêu cầu không hợp lệ",
                    "details": rejection.body_text(),
                })),
            ));
        }
    };

    let query = req.query.trim();
    if query.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Query không được để trống" })),
        ));
    }

    let filter = req.filter.unwrap_or_default();
    match state.retriever.plain(query, req.limit, &filter).await {
        Ok(results) => Ok(Json(PlainSearchResponse { results })),
        Err(e) => {
            tracing::error!("Plain search failed for {query:?}: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Có lỗi xảy ra khi tìm kiếm",
                    "details": e.to_string(),
                })),
            ))
        }
    }
}
