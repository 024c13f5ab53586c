//! Async front for the retrieval engine.
//!
//! Engine calls are synchronous and CPU-bound. [`ContextService`] runs them
//! on tokio's blocking pool and bounds queries with a timeout; a query that
//! times out or fails degrades to "no context" instead of an error, so a
//! caller building a prompt never waits on retrieval for long.

use anyhow::{Context, Result};
use context_recall_core::{IndexStats, RetrievalEngine, SearchResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::corpus::{load_corpus, SourceDocument};

#[derive(Clone)]
pub struct ContextService {
    engine: Arc<RetrievalEngine>,
    timeout: Duration,
}

impl ContextService {
    pub fn new(engine: Arc<RetrievalEngine>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    /// Build an engine from the config's tuning sections.
    pub fn from_config(config: &Config) -> Result<Self> {
        let engine = RetrievalEngine::try_new(config.engine_params())
            .context("Failed to create retrieval engine")?;
        Ok(Self::new(
            Arc::new(engine),
            Duration::from_millis(config.service.query_timeout_ms),
        ))
    }

    /// Build the service and index the configured corpus.
    pub async fn open(config: &Config) -> Result<Self> {
        let service = Self::from_config(config)?;
        let documents = load_corpus(config)?;
        service.index_documents(documents).await?;
        Ok(service)
    }

    pub fn engine(&self) -> &Arc<RetrievalEngine> {
        &self.engine
    }

    /// Add every document on a blocking task. Not time-bounded.
    pub async fn index_documents(&self, documents: Vec<SourceDocument>) -> Result<IndexStats> {
        let engine = Arc::clone(&self.engine);
        let count = documents.len();
        let stats = tokio::task::spawn_blocking(move || {
            for doc in &documents {
                engine.add_document(&doc.id, &doc.name, &doc.content);
            }
            engine.stats()
        })
        .await
        .context("Indexing task failed")?;

        info!(
            submitted = count,
            documents = stats.document_count,
            passages = stats.passage_count,
            "documents indexed"
        );
        Ok(stats)
    }

    /// Ranked results, or none if the query exceeds the timeout.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        let engine = Arc::clone(&self.engine);
        let query = query.to_string();
        self.bounded("search", move || engine.search(&query, top_k))
            .await
            .unwrap_or_default()
    }

    /// Assembled context, or `""` if the query exceeds the timeout.
    pub async fn relevant_context(&self, query: &str, max_chars: usize) -> String {
        let engine = Arc::clone(&self.engine);
        let query = query.to_string();
        self.bounded("context", move || engine.get_relevant_context(&query, max_chars))
            .await
            .unwrap_or_default()
    }

    async fn bounded<T, F>(&self, op: &'static str, f: F) -> Option<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let task = tokio::task::spawn_blocking(f);
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(op, error = %e, "retrieval task failed; continuing without context");
                None
            }
            Err(_) => {
                warn!(
                    op,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "retrieval timed out; continuing without context"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_recall_core::embedding::{HashingVectorizer, Vectorizer};
    use context_recall_core::params::HashingParams;
    use context_recall_core::{EngineParams, Vector};

    fn doc(id: &str, name: &str, content: &str) -> SourceDocument {
        SourceDocument {
            id: id.to_string(),
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    /// Hashing vectorizer that stalls on one specific input.
    struct StallingVectorizer {
        inner: HashingVectorizer,
    }

    impl Vectorizer for StallingVectorizer {
        fn model_name(&self) -> &str {
            "stalling"
        }

        fn dims(&self) -> usize {
            self.inner.dims()
        }

        fn embed(&self, text: &str) -> Vector {
            if text == "stall please" {
                std::thread::sleep(Duration::from_millis(300));
            }
            self.inner.embed(text)
        }
    }

    #[tokio::test]
    async fn test_index_then_query() {
        let service = ContextService::from_config(&Config::minimal()).unwrap();
        let stats = service
            .index_documents(vec![doc(
                "a",
                "notes.txt",
                "Alpha team ships Friday.\n\nBeta team ships Monday.",
            )])
            .await
            .unwrap();
        assert_eq!(stats.document_count, 1);

        let results = service.search("Friday", 3).await;
        assert_eq!(results[0].source, "notes.txt");

        let context = service.relevant_context("Friday", 4000).await;
        assert!(context.contains("Alpha team ships Friday."));
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_empty() {
        let engine = RetrievalEngine::with_vectorizer(
            EngineParams::default(),
            Box::new(StallingVectorizer {
                inner: HashingVectorizer::new(HashingParams::default()),
            }),
        );
        engine.add_document("a", "notes.txt", "stall please and more words");
        let service = ContextService::new(Arc::new(engine), Duration::from_millis(20));

        assert_eq!(service.relevant_context("stall please", 4000).await, "");
        assert!(service.search("stall please", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_engine_returns_nothing() {
        let service = ContextService::from_config(&Config::minimal()).unwrap();
        service
            .index_documents(vec![doc("a", "notes.txt", "Alpha team ships Friday.")])
            .await
            .unwrap();
        service.engine().set_enabled(false);
        assert!(service.search("Friday", 3).await.is_empty());
        assert_eq!(service.relevant_context("Friday", 4000).await, "");
    }
}
