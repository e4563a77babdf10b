pub mod books;
pub mod plain;
pub mod search;
pub mod settings;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// All HTTP routes. No CORS layer: the UI is served from the same origin.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", post(search::search))
        .route("/search/plain", post(plain::search_plain))
        .route("/api/books", get(books::list_books))
        .route("/api/books/{code}/{chapter}", get(books::get_chapter))
        .route("/api/config", get(settings::get_config))
        .with_state(state)
}
