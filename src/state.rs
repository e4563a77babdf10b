use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::corpus::Corpus;
use crate::llm::classifier::{Classifier, LlmClassifier};
use crate::llm::embeddings::{Embedder, HttpEmbedder};
use crate::search::retrieval::Retriever;
use crate::search::vector::{InMemoryIndex, QdrantIndex, VectorIndex};

/// Shared application state. Everything inside is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub corpus: Arc<Corpus>,
    pub classifier: Arc<dyn Classifier>,
    pub retriever: Retriever,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let corpus = Corpus::load(&config.corpus_path)?;

        // One pooled client for the LLM provider and Qdrant
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.service_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let index: Arc<dyn VectorIndex> = match &config.vectors_path {
            Some(path) => Arc::new(InMemoryIndex::open(path)?),
            None => {
                tracing::info!(
                    "Vector index: Qdrant collection {} at {}",
                    config.qdrant.collection,
                    config.qdrant.url
                );
                Arc::new(QdrantIndex::new(http_client.clone(), config.qdrant.clone()))
            }
        };
        let embedder = Arc::new(HttpEmbedder::new(http_client.clone(), config.llm.clone()));
        let classifier = Arc::new(LlmClassifier::new(http_client, config.llm.clone()));

        Ok(Self::with_services(config, corpus, classifier, embedder, index))
    }

    /// Assemble state from already-built services.
    pub fn with_services(
        config: Config,
        corpus: Corpus,
        classifier: Arc<dyn Classifier>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let corpus = Arc::new(corpus);
        Self {
            config: Arc::new(config),
            retriever: Retriever::new(corpus.clone(), embedder, index),
            corpus,
            classifier,
        }
    }

    pub fn reject_delay(&self) -> Duration {
        Duration::from_millis(self.config.reject_delay_ms)
    }
}
