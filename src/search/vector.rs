use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::config::QdrantConfig;
use crate::models::PassagePayload;

/// Equality conditions that every hit must satisfy
/// (serializes to Qdrant's `{"must": [{"key", "match": {"value"}}]}`).
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PayloadFilter {
    pub must: Vec<FieldCondition>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldCondition {
    pub key: String,
    #[serde(rename = "match")]
    pub matches: MatchValue,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchValue {
    pub value: Value,
}

impl PayloadFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must_equal(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.must.push(FieldCondition {
            key: key.to_string(),
            matches: MatchValue {
                value: value.into(),
            },
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
    }

    fn accepts(&self, payload: &Value) -> bool {
        self.must
            .iter()
            .all(|c| payload.get(&c.key) == Some(&c.matches.value))
    }
}

/// A nearest-neighbour hit with its stored payload.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: PassagePayload,
}

/// Nearest-neighbour search over verse-chunk embeddings.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        filter: &PayloadFilter,
    ) -> Result<Vec<ScoredPoint>>;
}

// ─── Qdrant ──────────────────────────────────────────────

/// Client for a pre-populated Qdrant collection (REST API).
pub struct QdrantIndex {
    client: reqwest::Client,
    config: QdrantConfig,
}

#[derive(Serialize)]
struct QdrantSearchRequest<'a> {
    vector: Vec<f32>,
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a PayloadFilter>,
    with_payload: bool,
}

#[derive(Deserialize)]
struct QdrantSearchResponse {
    result: Vec<QdrantPoint>,
}

#[derive(Deserialize)]
struct QdrantPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<PassagePayload>,
}

impl QdrantIndex {
    pub fn new(client: reqwest::Client, config: QdrantConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        filter: &PayloadFilter,
    ) -> Result<Vec<ScoredPoint>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.config.url, self.config.collection
        );

        let req = QdrantSearchRequest {
            vector,
            limit,
            filter: (!filter.is_empty()).then_some(filter),
            with_payload: true,
        };

        let mut builder = self.client.post(&url).json(&req);
        if let Some(key) = self.config.api_key.as_deref() {
            builder = builder.header("api-key", key);
        }

        let resp = builder
            .send()
            .await
            .context("Failed to call Qdrant search API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Qdrant search API returned {status}: {body}");
        }

        let body: QdrantSearchResponse = resp
            .json()
            .await
            .context("Failed to parse Qdrant search response")?;

        Ok(body.result.into_iter().map(into_scored_point).collect())
    }
}

/// The chunk id stored in the payload wins over the raw point id.
fn into_scored_point(point: QdrantPoint) -> ScoredPoint {
    let payload = point.payload.unwrap_or_default();
    let id = match (&payload.chunk_id, point.id) {
        (Some(chunk_id), _) if !chunk_id.is_empty() => chunk_id.clone(),
        (_, Value::String(s)) => s,
        (_, other) => other.to_string(),
    };
    ScoredPoint {
        id,
        score: point.score,
        payload,
    }
}

// ─── In-memory ───────────────────────────────────────────

/// A stored vector entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: String,
    pub embedding: Vec<f32>,
    pub payload: PassagePayload,
}

/// In-memory index with cosine similarity, for offline use and tests.
/// Read from a JSON array of [`VectorEntry`]; never written back.
pub struct InMemoryIndex {
    entries: RwLock<Vec<VectorEntry>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vector file {}", path.display()))?;
        let entries: Vec<VectorEntry> =
            serde_json::from_str(&data).context("Failed to parse vector file")?;
        tracing::info!("Loaded {} vectors from {}", entries.len(), path.display());
        Ok(Self {
            entries: RwLock::new(entries),
        })
    }

    pub fn insert(&self, entry: VectorEntry) {
        self.entries.write().push(entry);
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        filter: &PayloadFilter,
    ) -> Result<Vec<ScoredPoint>> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &VectorEntry)> = entries
            .iter()
            .filter(|e| {
                filter.is_empty()
                    || serde_json::to_value(&e.payload)
                        .map(|p| filter.accepts(&p))
                        .unwrap_or(false)
            })
            .map(|e| (cosine_similarity(&vector, &e.embedding), e))
            .collect();

        // Sort descending by score
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(score, e)| ScoredPoint {
                id: e.id.clone(),
                score,
                payload: e.payload.clone(),
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(book: &str, chapter: u32) -> PassagePayload {
        PassagePayload {
            book_code: book.into(),
            chapter,
            ..PassagePayload::default()
        }
    }

    #[test]
    fn test_filter_serializes_to_qdrant_shape() {
        let filter = PayloadFilter::new()
            .must_equal("bookCode", "JHN")
            .must_equal("chapter", 3);
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({ "must": [
                { "key": "bookCode", "match": { "value": "JHN" } },
                { "key": "chapter", "match": { "value": 3 } }
            ]})
        );
    }

    #[test]
    fn test_search_request_omits_empty_filter() {
        let req = QdrantSearchRequest {
            vector: vec![0.1],
            limit: 3,
            filter: None,
            with_payload: true,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("filter").is_none());
        assert_eq!(value["with_payload"], true);
    }

    #[test]
    fn test_point_id_prefers_chunk_id() {
        let point: QdrantPoint = serde_json::from_value(json!({
            "id": 42,
            "score": 0.8,
            "payload": { "chunkId": "JHN-3-1", "bookCode": "JHN", "chapter": 3 }
        }))
        .unwrap();
        assert_eq!(into_scored_point(point).id, "JHN-3-1");

        let point: QdrantPoint =
            serde_json::from_value(json!({ "id": 42, "score": 0.8, "payload": {} })).unwrap();
        assert_eq!(into_scored_point(point).id, "42");

        let point: QdrantPoint = serde_json::from_value(json!({
            "id": "5c56c793-69f3-4fbf-87e6-c4bf54c28c26",
            "score": 0.8
        }))
        .unwrap();
        let scored = into_scored_point(point);
        assert_eq!(scored.id, "5c56c793-69f3-4fbf-87e6-c4bf54c28c26");
        assert_eq!(scored.payload, PassagePayload::default());
    }

    #[test]
    fn test_null_payload_fields_keep_the_response() {
        let body: QdrantSearchResponse = serde_json::from_value(json!({
            "result": [
                {
                    "id": 1,
                    "score": 0.9,
                    "payload": { "chunkId": "JHN-3-16", "bookCode": "JHN", "chapter": 3, "text": "a", "wordCount": 28 }
                },
                {
                    "id": 2,
                    "score": 0.8,
                    "payload": { "bookCode": "JHN", "chapter": 3, "text": "b", "bookName": null, "verseStart": null }
                }
            ]
        }))
        .unwrap();

        let points: Vec<ScoredPoint> = body.result.into_iter().map(into_scored_point).collect();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].payload.word_count, Some(28));
        assert_eq!(points[1].id, "2");
        assert_eq!(points[1].payload.book_name, "");
        assert_eq!(points[1].payload.verse_start, 0);
        assert_eq!(points[1].payload.text, "b");
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_in_memory_search_orders_and_filters() {
        let index = InMemoryIndex::new();
        index.insert(VectorEntry {
            id: "a".into(),
            embedding: vec![1.0, 0.0],
            payload: payload("JHN", 3),
        });
        index.insert(VectorEntry {
            id: "b".into(),
            embedding: vec![0.9, 0.1],
            payload: payload("JHN", 4),
        });
        index.insert(VectorEntry {
            id: "c".into(),
            embedding: vec![0.0, 1.0],
            payload: payload("PSA", 23),
        });

        let all = index
            .search(vec![1.0, 0.0], 10, &PayloadFilter::new())
            .await
            .unwrap();
        let ids: Vec<&str> = all.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let jhn = index
            .search(vec![0.0, 1.0], 10, &PayloadFilter::new().must_equal("bookCode", "JHN"))
            .await
            .unwrap();
        assert_eq!(jhn.len(), 2);
        assert!(jhn.iter().all(|p| p.payload.book_code == "JHN"));

        let limited = index
            .search(vec![1.0, 0.0], 1, &PayloadFilter::new())
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_open_vector_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.json");
        std::fs::write(
            &path,
            r#"[{"id":"x","embedding":[0.5,0.5],"payload":{"bookCode":"ROM","chapter":8,"text":"..."}}]"#,
        )
        .unwrap();
        let index = InMemoryIndex::open(&path).unwrap();
        assert_eq!(index.entry_count(), 1);
    }
}
