use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::error::SearchError;

// ─── Corpus ──────────────────────────────────────────────

/// A single verse as stored in the corpus file. `verse_num` may carry
/// superscript digit markers (`"¹⁶"`), so it stays a string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verse {
    #[serde(rename = "verseNum")]
    pub verse_num: String,
    pub text: String,
}

/// A book of the corpus; the 3-letter code is the key it is stored under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub name: String,
    pub chapters: HashMap<String, Vec<Verse>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub code: String,
    pub name: String,
    pub total_chapters: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Testament {
    Old,
    New,
}

impl Testament {
    pub fn as_str(self) -> &'static str {
        match self {
            Testament::Old => "old",
            Testament::New => "new",
        }
    }
}

// ─── Routing decision ────────────────────────────────────

/// Decision object exactly as the classification service returns it.
/// Never used past [`RoutingDecision::try_from`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDecision {
    #[serde(default)]
    pub search_type: Option<String>,
    #[serde(default)]
    pub clarified_query: Option<String>,
    #[serde(default)]
    pub book_code: Option<String>,
    #[serde(default)]
    pub book_name: Option<String>,
    /// Models emit this as a number, a numeric string, or null.
    #[serde(default)]
    pub chapter: Option<serde_json::Value>,
}

/// Validated routing decision. Each variant carries exactly the fields its
/// retrieval strategy needs.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingDecision {
    Exact {
        book_code: String,
        book_name: Option<String>,
        chapter: u32,
    },
    Semantic {
        clarified_query: Option<String>,
    },
    Scoped {
        book_code: String,
        book_name: Option<String>,
        chapter: Option<u32>,
        clarified_query: Option<String>,
    },
    Invalid,
}

impl RoutingDecision {
    pub fn search_type(&self) -> &'static str {
        match self {
            RoutingDecision::Exact { .. } => "exact",
            RoutingDecision::Semantic { .. } => "semantic",
            RoutingDecision::Scoped { .. } => "scoped",
            RoutingDecision::Invalid => "invalid",
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_chapter(value: Option<serde_json::Value>) -> Result<Option<u32>, SearchError> {
    let chapter = match value {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };
    match chapter.and_then(|c| u32::try_from(c).ok()) {
        Some(c) if c > 0 => Ok(Some(c)),
        _ => Err(SearchError::ClassifierConsistency(
            "chapter is not a positive integer".to_string(),
        )),
    }
}

impl TryFrom<RawDecision> for RoutingDecision {
    type Error = SearchError;

    fn try_from(raw: RawDecision) -> Result<Self, Self::Error> {
        let search_type = raw
            .search_type
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let clarified_query = non_empty(raw.clarified_query);
        let book_code = non_empty(raw.book_code).map(|c| c.to_ascii_uppercase());
        let book_name = non_empty(raw.book_name);

        match search_type.as_str() {
            "exact" => {
                let chapter = parse_chapter(raw.chapter)?;
                match (book_code, chapter) {
                    (Some(book_code), Some(chapter)) => Ok(RoutingDecision::Exact {
                        book_code,
                        book_name,
                        chapter,
                    }),
                    _ => Err(SearchError::ClassifierConsistency(
                        "exact decision is missing bookCode or chapter".to_string(),
                    )),
                }
            }
            "semantic" => Ok(RoutingDecision::Semantic { clarified_query }),
            "scoped" => {
                let chapter = parse_chapter(raw.chapter)?;
                let book_code = book_code.ok_or_else(|| {
                    SearchError::ClassifierConsistency(
                        "scoped decision is missing bookCode".to_string(),
                    )
                })?;
                Ok(RoutingDecision::Scoped {
                    book_code,
                    book_name,
                    chapter,
                    clarified_query,
                })
            }
            "invalid" => Ok(RoutingDecision::Invalid),
            other => Err(SearchError::ClassifierConsistency(format!(
                "unknown searchType {other:?}"
            ))),
        }
    }
}

// ─── Retrieval results ───────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerseChunk {
    pub verse_start: u32,
    pub verse_end: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactResult {
    pub book_code: String,
    pub book_name: String,
    pub chapter: u32,
    pub chunks: Vec<VerseChunk>,
}

/// Metadata stored with each point in the vector index. Missing or `null`
/// fields fall back to their defaults so one sparse point cannot fail a
/// whole search response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PassagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub book_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub book_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chapter: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub verse_start: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub verse_end: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testament: Option<Testament>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u32>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One semantic hit: the point id, similarity score, and passage metadata.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Passage {
    pub id: String,
    pub score: f32,
    pub payload: PassagePayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct SemanticResult {
    pub results: Vec<Passage>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub book_code: String,
    pub book_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScopedResult {
    pub scope: Scope,
    pub results: Vec<Passage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RetrievalResult {
    Exact(ExactResult),
    Semantic(SemanticResult),
    Scoped(ScopedResult),
}

// ─── Streaming protocol ──────────────────────────────────

/// One server-sent event. Serializes to `{"message": ..}`, `{"result": ..}`
/// or `{"error": ..}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEvent {
    Message(String),
    Result(RetrievalResult),
    Error(String),
}

impl SearchEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchEvent::Message(_))
    }
}

// ─── Requests / responses ────────────────────────────────

/// Body of `POST /search`. A missing `query` is treated like an empty one.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlainSearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_plain_limit")]
    pub limit: usize,
    #[serde(default)]
    pub filter: Option<PlainFilter>,
}

fn default_plain_limit() -> usize {
    10
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainFilter {
    pub testament: Option<Testament>,
    pub book_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlainSearchResponse {
    pub results: Vec<Passage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterResponse {
    pub book_code: String,
    pub book_name: String,
    pub chapter: u32,
    pub verses: Vec<Verse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawDecision {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_exact_decision_with_numeric_chapter() {
        let decision = RoutingDecision::try_from(raw(json!({
            "searchType": "exact",
            "bookCode": "psa",
            "bookName": "Thi Thiên",
            "chapter": 23
        })))
        .unwrap();
        assert_eq!(
            decision,
            RoutingDecision::Exact {
                book_code: "PSA".into(),
                book_name: Some("Thi Thiên".into()),
                chapter: 23,
            }
        );
    }

    #[test]
    fn test_exact_decision_accepts_string_chapter() {
        let decision = RoutingDecision::try_from(raw(json!({
            "searchType": "exact",
            "bookCode": "JHN",
            "chapter": "3"
        })))
        .unwrap();
        assert!(matches!(decision, RoutingDecision::Exact { chapter: 3, .. }));
    }

    #[test]
    fn test_exact_without_chapter_is_inconsistent() {
        let err = RoutingDecision::try_from(raw(json!({
            "searchType": "exact",
            "bookCode": "JHN",
            "chapter": null
        })))
        .unwrap_err();
        assert!(matches!(err, SearchError::ClassifierConsistency(_)));
    }

    #[test]
    fn test_exact_without_book_is_inconsistent() {
        let err = RoutingDecision::try_from(raw(json!({
            "searchType": "exact",
            "chapter": 5
        })))
        .unwrap_err();
        assert!(matches!(err, SearchError::ClassifierConsistency(_)));
    }

    #[test]
    fn test_zero_chapter_is_inconsistent() {
        let err = RoutingDecision::try_from(raw(json!({
            "searchType": "scoped",
            "bookCode": "MAT",
            "chapter": 0
        })))
        .unwrap_err();
        assert!(matches!(err, SearchError::ClassifierConsistency(_)));
    }

    #[test]
    fn test_scoped_without_book_is_inconsistent() {
        let err = RoutingDecision::try_from(raw(json!({
            "searchType": "scoped",
            "clarifiedQuery": "phép lạ"
        })))
        .unwrap_err();
        assert!(matches!(err, SearchError::ClassifierConsistency(_)));
    }

    #[test]
    fn test_scoped_chapter_is_optional() {
        let decision = RoutingDecision::try_from(raw(json!({
            "searchType": "scoped",
            "clarifiedQuery": "phép lạ, quyền năng",
            "bookCode": "MAT"
        })))
        .unwrap();
        assert_eq!(
            decision,
            RoutingDecision::Scoped {
                book_code: "MAT".into(),
                book_name: None,
                chapter: None,
                clarified_query: Some("phép lạ, quyền năng".into()),
            }
        );
    }

    #[test]
    fn test_semantic_blank_clarified_query_becomes_none() {
        let decision = RoutingDecision::try_from(raw(json!({
            "searchType": "semantic",
            "clarifiedQuery": "   "
        })))
        .unwrap();
        assert_eq!(decision, RoutingDecision::Semantic { clarified_query: None });
    }

    #[test]
    fn test_unknown_search_type_is_inconsistent() {
        let err = RoutingDecision::try_from(raw(json!({ "searchType": "fuzzy" }))).unwrap_err();
        assert!(matches!(err, SearchError::ClassifierConsistency(_)));
        let err = RoutingDecision::try_from(raw(json!({}))).unwrap_err();
        assert!(matches!(err, SearchError::ClassifierConsistency(_)));
    }

    #[test]
    fn test_event_wire_shape() {
        let msg = serde_json::to_value(SearchEvent::Message("xin chào".into())).unwrap();
        assert_eq!(msg, json!({ "message": "xin chào" }));
        let err = serde_json::to_value(SearchEvent::Error("lỗi".into())).unwrap();
        assert_eq!(err, json!({ "error": "lỗi" }));
    }

    #[test]
    fn test_result_event_is_tagged_by_type() {
        let event = SearchEvent::Result(RetrievalResult::Scoped(ScopedResult {
            scope: Scope {
                book_code: "JHN".into(),
                book_name: "Giăng".into(),
                chapter: None,
            },
            results: vec![],
        }));
        let value = serde_json::to_value(event).unwrap();
        assert_eq!(value["result"]["type"], "scoped");
        assert_eq!(value["result"]["scope"]["bookName"], "Giăng");
        assert!(value["result"]["scope"].get("chapter").is_none());
    }

    #[test]
    fn test_plain_request_defaults() {
        let req: PlainSearchRequest = serde_json::from_value(json!({ "query": "bình an" })).unwrap();
        assert_eq!(req.limit, 10);
        assert!(req.filter.is_none());

        let req: PlainSearchRequest = serde_json::from_value(json!({
            "query": "bình an",
            "filter": { "testament": "new", "bookCode": "ROM" }
        }))
        .unwrap();
        let filter = req.filter.unwrap();
        assert_eq!(filter.testament, Some(Testament::New));
        assert_eq!(filter.book_code.as_deref(), Some("ROM"));
    }
}
