use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::error::SearchError;
use crate::models::{BookSummary, ChapterResponse};
use crate::state::AppState;

/// GET /api/books - All books in canonical order
pub async fn list_books(State(state): State<AppState>) -> Json<Vec<BookSummary>> {
    Json(state.corpus.list_books())
}

/// GET /api/books/{code}/{chapter} - Verses of one chapter
pub async fn get_chapter(
    State(state): State<AppState>,
    Path((code, chapter)): Path<(String, u32)>,
) -> Result<Json<ChapterResponse>, (StatusCode, Json<Value>)> {
    let code = code.to_ascii_uppercase();
    let verses = state.corpus.get_chapter(&code, chapter);
    if verses.is_empty() {
        let err = SearchError::ChapterNotFound {
            book_code: code,
            chapter,
        };
        return Err((StatusCode::NOT_FOUND, Json(json!({ "error": err.user_message() }))));
    }

    Ok(Json(ChapterResponse {
        book_name: state.corpus.display_name(&code),
        book_code: code,
        chapter,
        verses: verses.to_vec(),
    }))
}
