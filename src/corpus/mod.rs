//! Read-only Bible corpus: book code → chapter number → ordered verses.
//!
//! Loaded once at startup and shared behind an `Arc`; nothing mutates it
//! afterwards.

pub mod books;
pub mod reference;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use crate::models::{Book, BookSummary, Testament, Verse};

pub struct Corpus {
    books: HashMap<String, Book>,
}

impl Corpus {
    /// Load the corpus JSON file (`{"GEN": {"name": .., "chapters": {"1": [..]}}}`).
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus file {}", path.display()))?;
        let books: HashMap<String, Book> = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse corpus file {}", path.display()))?;

        let corpus = Self::from_books(books);
        let verse_count: usize = corpus
            .books
            .values()
            .flat_map(|b| b.chapters.values())
            .map(Vec::len)
            .sum();
        tracing::info!(
            "Corpus loaded: {} books, {} verses",
            corpus.books.len(),
            verse_count
        );
        for code in corpus.books.keys() {
            if books::canonical_index(code).is_none() {
                tracing::warn!("Corpus contains non-canonical book code {code}");
            }
        }
        Ok(corpus)
    }

    pub fn from_books(books: HashMap<String, Book>) -> Self {
        let books = books
            .into_iter()
            .map(|(code, book)| (code.to_ascii_uppercase(), book))
            .collect();
        Self { books }
    }

    pub fn get_book(&self, code: &str) -> Option<&Book> {
        self.books.get(code)
    }

    /// Verses of a chapter in corpus order; empty when the book or chapter
    /// does not exist.
    pub fn get_chapter(&self, code: &str, chapter: u32) -> &[Verse] {
        self.books
            .get(code)
            .and_then(|b| b.chapters.get(&chapter.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Books present in the corpus, in canonical order.
    pub fn list_books(&self) -> Vec<BookSummary> {
        books::CANONICAL_BOOKS
            .iter()
            .filter_map(|(code, _)| {
                self.books.get(*code).map(|book| BookSummary {
                    code: code.to_string(),
                    name: self.display_name(code),
                    total_chapters: book.chapters.len(),
                })
            })
            .collect()
    }

    /// Canonical Vietnamese name, falling back to the file's name and then
    /// the code itself.
    pub fn display_name(&self, code: &str) -> String {
        if let Some(name) = books::canonical_name(code) {
            return name.to_string();
        }
        self.books
            .get(code)
            .map(|b| b.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| code.to_string())
    }

    pub fn testament(&self, code: &str) -> Option<Testament> {
        books::testament_of(code)
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }
}
