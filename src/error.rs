use thiserror::Error;

/// Everything that can end a search request early.
///
/// Each variant maps to one user-facing message via [`SearchError::user_message`];
/// the `Display` text is the detailed form that goes to the logs.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Empty or missing query.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Classification service unreachable or returned unparsable output.
    #[error("classification failed: {0}")]
    Classification(String),

    /// Classifier returned a decision that breaks its own contract
    /// (e.g. `exact` without a chapter, or an unknown `searchType`).
    #[error("classifier returned an inconsistent decision: {0}")]
    ClassifierConsistency(String),

    /// Exact lookup found no verses for the resolved book/chapter.
    #[error("chapter {chapter} not found in book {book_code}")]
    ChapterNotFound { book_code: String, chapter: u32 },

    /// Embedding service or vector index call failed.
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// Classifier judged the query to be outside the corpus domain.
    #[error("query rejected as out of domain")]
    RejectedDomain,
}

pub const EMPTY_QUERY_MESSAGE: &str = "Vui lòng nhập câu hỏi";

pub const REJECTED_MESSAGE: &str = "Tôi chỉ có thể tìm Lời Chúa về: cảm xúc, tình huống sống, đạo đức, \
     nhân vật Kinh Thánh, hoặc triết học nhân sinh. Thử hỏi điều khác nhé! 😊";

const GENERIC_MESSAGE: &str = "Có lỗi xảy ra khi tìm kiếm";

impl SearchError {
    /// Message shown to the caller in the `error` event.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Validation(_) => EMPTY_QUERY_MESSAGE.to_string(),
            SearchError::ChapterNotFound { book_code, chapter } => {
                format!("Không tìm thấy chương {chapter} trong sách {book_code}")
            }
            SearchError::RejectedDomain => REJECTED_MESSAGE.to_string(),
            SearchError::Classification(_)
            | SearchError::ClassifierConsistency(_)
            | SearchError::Retrieval(_) => GENERIC_MESSAGE.to_string(),
        }
    }

    pub fn retrieval(err: impl std::fmt::Display) -> Self {
        SearchError::Retrieval(format!("{err:#}"))
    }

    pub fn classification(err: impl std::fmt::Display) -> Self {
        SearchError::Classification(format!("{err:#}"))
    }
}
