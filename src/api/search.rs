use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::SearchError;
use crate::models::{RetrievalResult, RoutingDecision, SearchEvent, SearchRequest};
use crate::search::retrieval::DEFAULT_LIMIT;
use crate::state::AppState;

const ANALYZING_MESSAGE: &str = "Đang phân tích câu hỏi của bạn...";
const OUT_OF_SCOPE_MESSAGE: &str = "Hmm... câu hỏi này không nằm trong phạm vi Kinh Thánh";
const EXACT_MESSAGE: &str = "Đây là đoạn Kinh Thánh mà bạn cần";

/// Events buffered between the producer task and the HTTP body.
const EVENT_BUFFER: usize = 8;

/// Terminal state of one search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Completed,
    Rejected,
    Failed,
    /// The client went away before the terminal event was delivered.
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Received,
    Classifying,
    Dispatching,
    Retrieving,
}

/// What a failing request had reached, for the error log.
struct Progress {
    stage: Stage,
    decision: Option<RoutingDecision>,
}

/// POST /search - Classify the query, run the matching retrieval strategy,
/// and stream progress as server-sent events.
///
/// An unreadable body is treated like an empty query so the caller still
/// gets an `error` event instead of a bare 4xx.
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> impl IntoResponse {
    let query = match payload {
        Ok(Json(req)) => req.query,
        Err(e) => {
            tracing::warn!("Unreadable search request body: {e}");
            String::new()
        }
    };

    let events = run_search(state, query).map(|event| Event::default().json_data(event));

    ([(header::CONNECTION, "keep-alive")], Sse::new(events))
}

/// Start a search in its own task and return the event stream it feeds.
///
/// The stream ends after exactly one `result` or `error` event. Dropping the
/// stream cancels the task, including any in-flight service call.
pub fn run_search(state: AppState, query: String) -> ReceiverStream<SearchEvent> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    tokio::spawn(async move {
        let outcome = tokio::select! {
            outcome = drive(&state, &query, &tx) => outcome,
            _ = tx.closed() => SearchOutcome::Cancelled,
        };
        tracing::info!(?outcome, "Search finished for {:?}", query.trim());
        // tx dropped here, closing the stream
    });

    ReceiverStream::new(rx)
}

async fn drive(state: &AppState, query: &str, tx: &mpsc::Sender<SearchEvent>) -> SearchOutcome {
    let query = query.trim();
    let mut progress = Progress {
        stage: Stage::Received,
        decision: None,
    };

    let (event, outcome) = match route(state, query, tx, &mut progress).await {
        Ok(result) => (SearchEvent::Result(result), SearchOutcome::Completed),
        Err(SearchError::RejectedDomain) => (
            SearchEvent::Error(SearchError::RejectedDomain.user_message()),
            SearchOutcome::Rejected,
        ),
        Err(err @ SearchError::Validation(_)) => {
            tracing::debug!("Rejected empty query");
            (SearchEvent::Error(err.user_message()), SearchOutcome::Failed)
        }
        Err(err) => {
            tracing::error!(
                stage = ?progress.stage,
                decision = ?progress.decision,
                "Search failed for {query:?}: {err}"
            );
            (SearchEvent::Error(err.user_message()), SearchOutcome::Failed)
        }
    };

    if tx.send(event).await.is_err() {
        return SearchOutcome::Cancelled;
    }
    outcome
}

async fn route(
    state: &AppState,
    query: &str,
    tx: &mpsc::Sender<SearchEvent>,
    progress: &mut Progress,
) -> Result<RetrievalResult, SearchError> {
    if query.is_empty() {
        return Err(SearchError::Validation("query is empty".to_string()));
    }

    progress.stage = Stage::Classifying;
    let ((), decision) = tokio::join!(
        send_message(tx, ANALYZING_MESSAGE.to_string()),
        state.classifier.classify(query)
    );
    let decision = decision?;
    tracing::info!("Query {query:?} routed as {}: {decision:?}", decision.search_type());
    progress.decision = Some(decision.clone());

    progress.stage = Stage::Dispatching;
    match decision {
        RoutingDecision::Invalid => {
            send_message(tx, OUT_OF_SCOPE_MESSAGE.to_string()).await;
            tokio::time::sleep(state.reject_delay()).await;
            Err(SearchError::RejectedDomain)
        }
        RoutingDecision::Exact {
            book_code, chapter, ..
        } => {
            send_message(tx, EXACT_MESSAGE.to_string()).await;
            progress.stage = Stage::Retrieving;
            let result = state.retriever.exact(&book_code, chapter)?;
            Ok(RetrievalResult::Exact(result))
        }
        RoutingDecision::Semantic { clarified_query } => {
            let phrase = clarified_query.as_deref().unwrap_or(query);
            send_message(tx, format!("Tôi sẽ tìm Lời Chúa liên quan đến: {phrase}")).await;
            progress.stage = Stage::Retrieving;
            let result = state.retriever.semantic(phrase, DEFAULT_LIMIT).await?;
            Ok(RetrievalResult::Semantic(result))
        }
        RoutingDecision::Scoped {
            book_code,
            book_name,
            chapter,
            clarified_query,
        } => {
            let phrase = clarified_query.as_deref().unwrap_or(query);
            let book = book_name.as_deref().unwrap_or(&book_code);
            let scope = match chapter {
                Some(chapter) => format!("{book} chương {chapter}"),
                None => format!("sách {book}"),
            };
            send_message(
                tx,
                format!("Tôi sẽ tìm Lời Chúa trong {scope}, liên quan đến: {phrase}"),
            )
            .await;
            progress.stage = Stage::Retrieving;
            let result = state
                .retriever
                .scoped(phrase, &book_code, chapter, DEFAULT_LIMIT)
                .await?;
            Ok(RetrievalResult::Scoped(result))
        }
    }
}

/// Progress messages are best effort: a closed channel is noticed by the
/// `select!` in [`run_search`], which drops the request.
async fn send_message(tx: &mpsc::Sender<SearchEvent>, text: String) {
    let _ = tx.send(SearchEvent::Message(text)).await;
}
