//! The three retrieval strategies (exact lookup, semantic, scoped semantic)
//! plus the unrouted filter search behind `/search/plain`.

use std::sync::Arc;

use crate::corpus::Corpus;
use crate::error::SearchError;
use crate::llm::embeddings::Embedder;
use crate::models::{
    ExactResult, Passage, PlainFilter, Scope, ScopedResult, SemanticResult, Verse, VerseChunk,
};
use crate::search::vector::{PayloadFilter, ScoredPoint, VectorIndex};

pub const DEFAULT_LIMIT: usize = 3;
pub const MAX_PLAIN_LIMIT: usize = 50;
const EXACT_CHUNK_COUNT: usize = 3;

/// Look up a whole chapter and split it into up to three contiguous chunks.
pub fn exact_search(corpus: &Corpus, book_code: &str, chapter: u32) -> Result<ExactResult, SearchError> {
    let verses = corpus.get_chapter(book_code, chapter);
    if verses.is_empty() {
        tracing::info!("Chapter not found: {book_code} {chapter}");
        return Err(SearchError::ChapterNotFound {
            book_code: book_code.to_string(),
            chapter,
        });
    }
    tracing::info!("Exact lookup {book_code} {chapter}: {} verses", verses.len());

    Ok(ExactResult {
        book_code: book_code.to_string(),
        book_name: corpus.display_name(book_code),
        chapter,
        chunks: chunk_chapter(verses),
    })
}

/// Partition into `ceil(n/3)`-sized slices; the last takes the remainder and
/// empty slices are dropped.
pub fn chunk_chapter(verses: &[Verse]) -> Vec<VerseChunk> {
    if verses.is_empty() {
        return Vec::new();
    }
    let size = verses.len().div_ceil(EXACT_CHUNK_COUNT);

    let mut offset = 0;
    verses
        .chunks(size)
        .map(|chunk| {
            let start = offset;
            offset += chunk.len();
            VerseChunk {
                verse_start: verse_number(&chunk[0], start + 1),
                verse_end: verse_number(&chunk[chunk.len() - 1], offset),
                text: chunk
                    .iter()
                    .map(|v| v.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            }
        })
        .collect()
}

/// Printed verse number without superscript or other decoration: the first
/// run of ASCII digits, so a merged label like `"1-2"` reads as 1. Falls back
/// to superscript digits, then to the 1-based position in the chapter.
pub fn verse_number(verse: &Verse, position: usize) -> u32 {
    let ascii: String = verse
        .verse_num
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    if let Ok(n) = ascii.parse() {
        return n;
    }
    let superscript: String = verse
        .verse_num
        .chars()
        .filter_map(superscript_digit)
        .collect();
    superscript
        .parse()
        .unwrap_or_else(|_| u32::try_from(position).unwrap_or(u32::MAX))
}

fn superscript_digit(c: char) -> Option<char> {
    let digit = match c {
        '⁰' => '0',
        '¹' => '1',
        '²' => '2',
        '³' => '3',
        '⁴' => '4',
        '⁵' => '5',
        '⁶' => '6',
        '⁷' => '7',
        '⁸' => '8',
        '⁹' => '9',
        _ => return None,
    };
    Some(digit)
}

/// Embedding + vector index + corpus, shared by every semantic strategy.
#[derive(Clone)]
pub struct Retriever {
    pub corpus: Arc<Corpus>,
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(corpus: Arc<Corpus>, embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            corpus,
            embedder,
            index,
        }
    }

    pub fn exact(&self, book_code: &str, chapter: u32) -> Result<ExactResult, SearchError> {
        exact_search(&self.corpus, book_code, chapter)
    }

    /// Nearest passages across the whole corpus.
    pub async fn semantic(&self, query: &str, limit: usize) -> Result<SemanticResult, SearchError> {
        let results = self.search(query, limit, &PayloadFilter::new()).await?;
        tracing::info!("Semantic search {query:?}: {} results", results.len());
        Ok(SemanticResult { results })
    }

    /// Nearest passages within one book, and one chapter if given.
    pub async fn scoped(
        &self,
        query: &str,
        book_code: &str,
        chapter: Option<u32>,
        limit: usize,
    ) -> Result<ScopedResult, SearchError> {
        let mut filter = PayloadFilter::new().must_equal("bookCode", book_code);
        if let Some(chapter) = chapter {
            filter = filter.must_equal("chapter", chapter);
        }

        let mut results = self.search(query, limit, &filter).await?;
        let before = results.len();
        results.retain(|p| {
            p.payload.book_code == book_code && chapter.map_or(true, |c| p.payload.chapter == c)
        });
        if results.len() != before {
            tracing::warn!(
                "Vector index returned {} hits outside {book_code} {chapter:?}",
                before - results.len()
            );
        }
        tracing::info!(
            "Scoped search {query:?} in {book_code} {chapter:?}: {} results",
            results.len()
        );

        Ok(ScopedResult {
            scope: Scope {
                book_code: book_code.to_string(),
                book_name: self.corpus.display_name(book_code),
                chapter,
            },
            results,
        })
    }

    /// Semantic search with optional testament/book filters, no routing.
    pub async fn plain(
        &self,
        query: &str,
        limit: usize,
        filter: &PlainFilter,
    ) -> Result<Vec<Passage>, SearchError> {
        let mut payload_filter = PayloadFilter::new();
        if let Some(testament) = filter.testament {
            payload_filter = payload_filter.must_equal("testament", testament.as_str());
        }
        if let Some(code) = filter.book_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            payload_filter = payload_filter.must_equal("bookCode", code.to_ascii_uppercase());
        }
        self.search(query, limit.clamp(1, MAX_PLAIN_LIMIT), &payload_filter)
            .await
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        filter: &PayloadFilter,
    ) -> Result<Vec<Passage>, SearchError> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(SearchError::retrieval)?;
        let points = self
            .index
            .search(vector, limit, filter)
            .await
            .map_err(SearchError::retrieval)?;
        Ok(points.into_iter().map(|p| self.to_passage(p)).collect())
    }

    /// Fill display name and testament from the corpus when the stored
    /// payload lacks them.
    fn to_passage(&self, point: ScoredPoint) -> Passage {
        let mut payload = point.payload;
        if payload.book_name.is_empty() && !payload.book_code.is_empty() {
            payload.book_name = self.corpus.display_name(&payload.book_code);
        }
        if payload.testament.is_none() {
            payload.testament = self.corpus.testament(&payload.book_code);
        }
        Passage {
            id: point.id,
            score: point.score,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Book, PassagePayload, Testament};
    use crate::search::vector::{InMemoryIndex, VectorEntry};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;

    fn verses(n: usize) -> Vec<Verse> {
        (1..=n)
            .map(|i| Verse {
                verse_num: i.to_string(),
                text: format!("câu {i}"),
            })
            .collect()
    }

    fn corpus_with(book: &str, chapter: &str, n: usize) -> Corpus {
        Corpus::from_books(HashMap::from([(
            book.to_string(),
            Book {
                name: String::new(),
                chapters: HashMap::from([(chapter.to_string(), verses(n))]),
            },
        )]))
    }

    #[test]
    fn test_chunk_sizes() {
        let sizes = |n: usize| -> Vec<u32> {
            chunk_chapter(&verses(n))
                .iter()
                .map(|c| c.verse_end - c.verse_start + 1)
                .collect()
        };
        assert_eq!(sizes(6), vec![2, 2, 2]);
        assert_eq!(sizes(7), vec![3, 3, 1]);
        assert_eq!(sizes(8), vec![3, 3, 2]);
        assert_eq!(sizes(2), vec![1, 1]);
        assert_eq!(sizes(1), vec![1]);
        assert_eq!(sizes(4), vec![2, 2]);
        assert!(chunk_chapter(&[]).is_empty());
    }

    #[test]
    fn test_chunks_partition_and_reconstruct_chapter() {
        for n in 1..=40 {
            let vs = verses(n);
            let chunks = chunk_chapter(&vs);
            let size = n.div_ceil(3);

            assert!(chunks.len() <= 3);
            let mut expected_start = 1;
            for (i, chunk) in chunks.iter().enumerate() {
                assert_eq!(chunk.verse_start, expected_start);
                let len = (chunk.verse_end - chunk.verse_start + 1) as usize;
                if i + 1 < chunks.len() {
                    assert_eq!(len, size);
                } else {
                    assert!(len <= size);
                }
                expected_start = chunk.verse_end + 1;
            }
            assert_eq!(expected_start as usize, n + 1);

            let joined: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            let full: Vec<&str> = vs.iter().map(|v| v.text.as_str()).collect();
            assert_eq!(joined.join(" "), full.join(" "));
        }
    }

    #[test]
    fn test_verse_number_strips_decoration() {
        let v = |s: &str| Verse {
            verse_num: s.into(),
            text: String::new(),
        };
        assert_eq!(verse_number(&v("12"), 1), 12);
        assert_eq!(verse_number(&v("¹12"), 1), 12);
        assert_eq!(verse_number(&v("¹⁶"), 1), 16);
        assert_eq!(verse_number(&v("*"), 7), 7);
    }

    #[test]
    fn test_merged_verse_label_uses_first_number() {
        let v = |s: &str| Verse {
            verse_num: s.into(),
            text: String::new(),
        };
        assert_eq!(verse_number(&v("1-2"), 1), 1);
        assert_eq!(verse_number(&v("¹⁴ 14-15"), 3), 14);
    }

    #[test]
    fn test_exact_search_not_found() {
        let corpus = corpus_with("PSA", "23", 6);
        let err = exact_search(&corpus, "PSA", 151).unwrap_err();
        assert!(matches!(err, SearchError::ChapterNotFound { chapter: 151, .. }));
        assert!(exact_search(&corpus, "GEN", 1).is_err());
    }

    #[test]
    fn test_exact_search_uses_display_name() {
        let corpus = corpus_with("PSA", "23", 6);
        let result = exact_search(&corpus, "PSA", 23).unwrap();
        assert_eq!(result.book_name, "Thi-thiên");
        assert_eq!(result.chunks.len(), 3);
    }

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            anyhow::bail!("embedding service unavailable")
        }
    }

    fn entry(id: &str, book: &str, chapter: u32, embedding: Vec<f32>) -> VectorEntry {
        VectorEntry {
            id: id.into(),
            embedding,
            payload: PassagePayload {
                book_code: book.into(),
                chapter,
                text: format!("{book} {chapter}"),
                ..PassagePayload::default()
            },
        }
    }

    fn retriever(embedder: Arc<dyn Embedder>) -> Retriever {
        let index = InMemoryIndex::new();
        index.insert(entry("jhn-3", "JHN", 3, vec![1.0, 0.0]));
        index.insert(entry("jhn-15", "JHN", 15, vec![0.9, 0.1]));
        index.insert(entry("psa-23", "PSA", 23, vec![0.8, 0.2]));
        index.insert(entry("rom-8", "ROM", 8, vec![0.0, 1.0]));
        Retriever::new(
            Arc::new(corpus_with("JHN", "3", 3)),
            embedder,
            Arc::new(index),
        )
    }

    #[tokio::test]
    async fn test_semantic_fills_name_and_testament() {
        let r = retriever(Arc::new(FixedEmbedder(vec![1.0, 0.0])));
        let result = r.semantic("tình yêu", DEFAULT_LIMIT).await.unwrap();
        assert_eq!(result.results.len(), 3);
        let top = &result.results[0];
        assert_eq!(top.id, "jhn-3");
        assert_eq!(top.payload.book_name, "Giăng");
        assert_eq!(top.payload.testament, Some(Testament::New));
        assert_eq!(result.results[2].payload.testament, Some(Testament::Old));
    }

    #[tokio::test]
    async fn test_scoped_book_and_chapter() {
        let r = retriever(Arc::new(FixedEmbedder(vec![0.0, 1.0])));
        let result = r.scoped("tình yêu", "JHN", Some(3), DEFAULT_LIMIT).await.unwrap();
        assert_eq!(result.results.len(), 1);
        assert!(result
            .results
            .iter()
            .all(|p| p.payload.book_code == "JHN" && p.payload.chapter == 3));
        assert_eq!(result.scope.book_name, "Giăng");
        assert_eq!(result.scope.chapter, Some(3));
    }

    #[tokio::test]
    async fn test_scoped_book_only() {
        let r = retriever(Arc::new(FixedEmbedder(vec![0.0, 1.0])));
        let result = r.scoped("tình yêu", "JHN", None, DEFAULT_LIMIT).await.unwrap();
        assert_eq!(result.results.len(), 2);
        assert!(result.results.iter().all(|p| p.payload.book_code == "JHN"));
    }

    #[tokio::test]
    async fn test_plain_filters_by_testament() {
        let r = retriever(Arc::new(FixedEmbedder(vec![1.0, 0.0])));
        let filter = PlainFilter {
            testament: Some(Testament::Old),
            book_code: None,
        };
        // filters apply to stored payload only; these entries carry no testament
        let results = r.plain("bình an", 10, &filter).await.unwrap();
        assert!(results.is_empty());

        let filter = PlainFilter {
            testament: None,
            book_code: Some("rom".into()),
        };
        let results = r.plain("bình an", 10, &filter).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].payload.book_code, "ROM");
    }

    #[tokio::test]
    async fn test_embedding_failure_is_retrieval_error() {
        let r = retriever(Arc::new(FailingEmbedder));
        let err = r.semantic("tình yêu", DEFAULT_LIMIT).await.unwrap_err();
        match err {
            SearchError::Retrieval(cause) => assert!(cause.contains("unavailable")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
