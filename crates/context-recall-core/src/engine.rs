//! The [`RetrievalEngine`] facade.
//!
//! Owns the index, the cached vectorizer, and the tuning parameters behind
//! a single `parking_lot::RwLock`. All methods take `&self` and are safe
//! to call from many threads at once:
//!
//! - `search` and `get_relevant_context` hold the read lock while scoring.
//! - `add_document` chunks and vectorizes outside the lock and swaps the
//!   new entry in under the write lock.
//! - `remove_document`, `reindex_all`, and `update_params` hold the write
//!   lock for their whole mutation.
//!
//! Readers therefore never observe a half-replaced document.

use anyhow::Result;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::context::assemble_context;
use crate::embedding::{CacheStats, CachedVectorizer, HashingVectorizer, Vectorizer};
use crate::index::{build_document, Index};
use crate::models::{Document, DocumentSummary, IndexStats, SearchResult};
use crate::params::EngineParams;
use crate::search;

/// Parameters and the vectorizer built from them.
///
/// Replaced as a unit so that an in-flight `add_document` can detect that
/// it vectorized with stale settings.
struct Settings {
    params: EngineParams,
    vectorizer: Arc<CachedVectorizer>,
    /// The vectorizer was supplied by the caller, not derived from
    /// `params.hashing`.
    custom: bool,
}

struct State {
    index: Index,
    settings: Arc<Settings>,
}

/// In-memory retrieval engine: index, search, and context assembly.
pub struct RetrievalEngine {
    state: RwLock<State>,
    enabled: AtomicBool,
}

impl RetrievalEngine {
    /// Create an engine with the default hashing vectorizer.
    ///
    /// `params` is used as given; see [`try_new`](Self::try_new) for a
    /// validating constructor.
    pub fn new(params: EngineParams) -> Self {
        let vectorizer = hashing_vectorizer(&params);
        Self::from_settings(Settings {
            params,
            vectorizer,
            custom: false,
        })
    }

    /// Validate `params`, then create the engine.
    pub fn try_new(params: EngineParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::new(params))
    }

    /// Create an engine around a caller-supplied vectorizer.
    ///
    /// The vectorizer is wrapped in the engine's cache; `params.hashing` is
    /// ignored.
    pub fn with_vectorizer(params: EngineParams, vectorizer: Box<dyn Vectorizer>) -> Self {
        let vectorizer = Arc::new(CachedVectorizer::new(vectorizer, params.cache_capacity));
        Self::from_settings(Settings {
            params,
            vectorizer,
            custom: true,
        })
    }

    fn from_settings(settings: Settings) -> Self {
        Self {
            state: RwLock::new(State {
                index: Index::new(),
                settings: Arc::new(settings),
            }),
            enabled: AtomicBool::new(true),
        }
    }

    /// Add or replace a document.
    ///
    /// Re-adding byte-identical content is a no-op apart from updating the
    /// display name.
    pub fn add_document(&self, id: &str, name: &str, content: &str) {
        if self.refresh_if_unchanged(id, name, content) {
            debug!(id, "document unchanged");
            return;
        }

        loop {
            let settings = self.state.read().settings.clone();
            let entry = build_document(
                Document {
                    id: id.to_string(),
                    name: name.to_string(),
                    content: content.to_string(),
                },
                &settings.params.chunking,
                settings.vectorizer.as_ref(),
            );
            let passages = entry.passages.len();

            let mut state = self.state.write();
            if !Arc::ptr_eq(&state.settings, &settings) {
                // Parameters changed while vectorizing; rebuild with the new ones.
                continue;
            }
            let replaced = state.index.insert(entry).is_some();
            debug!(id, passages, replaced, "document indexed");
            return;
        }
    }

    /// Returns true when `id` already holds `content`, updating its name.
    fn refresh_if_unchanged(&self, id: &str, name: &str, content: &str) -> bool {
        let state = self.state.upgradable_read();
        let (unchanged, renamed) = match state.index.get(id) {
            Some(entry) if entry.document.content == content => (true, entry.document.name != name),
            _ => (false, false),
        };
        if renamed {
            let mut state = RwLockUpgradableReadGuard::upgrade(state);
            if let Some(entry) = state.index.get_mut(id) {
                entry.document.name = name.to_string();
            }
        }
        unchanged
    }

    /// Remove a document and all its passages. No-op if absent.
    pub fn remove_document(&self, id: &str) {
        if self.state.write().index.remove(id).is_some() {
            debug!(id, "document removed");
        }
    }

    /// Rank passages for `query`, returning at most `top_k` results (more
    /// when a specific term raises the limit).
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        if !self.is_enabled() {
            return Vec::new();
        }
        let state = self.state.read();
        search::search(
            &state.index,
            state.settings.vectorizer.as_ref(),
            &state.settings.params,
            query,
            top_k,
        )
    }

    /// Search with the configured `default_top_k` and assemble the results
    /// into at most `max_chars` chars. `""` means no relevant context.
    pub fn get_relevant_context(&self, query: &str, max_chars: usize) -> String {
        if !self.is_enabled() || max_chars == 0 {
            return String::new();
        }
        let state = self.state.read();
        let params = &state.settings.params;
        let results = search::search(
            &state.index,
            state.settings.vectorizer.as_ref(),
            params,
            query,
            params.search.default_top_k,
        );
        assemble_context(&results, max_chars, &params.context)
    }

    /// Re-chunk and re-vectorize every document from its stored content.
    pub fn reindex_all(&self) {
        let mut state = self.state.write();
        let settings = state.settings.clone();
        rebuild(&mut state.index, &settings);
        info!(documents = state.index.len(), "reindexed all documents");
    }

    /// Validate and apply new parameters, then reindex every document.
    ///
    /// The hashing vectorizer and its cache are rebuilt when the hashing
    /// parameters or cache capacity change. A caller-supplied vectorizer is
    /// kept as is.
    pub fn update_params(&self, params: EngineParams) -> Result<()> {
        params.validate()?;

        let mut state = self.state.write();
        let current = state.settings.clone();
        let vectorizer = if current.custom
            || (current.params.hashing == params.hashing
                && current.params.cache_capacity == params.cache_capacity)
        {
            current.vectorizer.clone()
        } else {
            hashing_vectorizer(&params)
        };

        let settings = Arc::new(Settings {
            params,
            vectorizer,
            custom: current.custom,
        });
        rebuild(&mut state.index, &settings);
        state.settings = settings;
        info!(documents = state.index.len(), "parameters updated");
        Ok(())
    }

    pub fn stats(&self) -> IndexStats {
        self.state.read().index.stats()
    }

    /// True iff at least one document with at least one passage is indexed.
    pub fn is_ready(&self) -> bool {
        self.state.read().index.is_ready()
    }

    /// Enable or disable retrieval. Indexed data is kept while disabled.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        info!(enabled, "retrieval toggled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.state.read().settings.vectorizer.cache().stats()
    }

    /// The stored copy of a document.
    pub fn document(&self, id: &str) -> Option<Document> {
        self.state.read().index.document(id).cloned()
    }

    /// Indexed documents in insertion order.
    pub fn documents(&self) -> Vec<DocumentSummary> {
        self.state
            .read()
            .index
            .documents()
            .map(|entry| entry.summary())
            .collect()
    }

    pub fn params(&self) -> EngineParams {
        self.state.read().settings.params.clone()
    }

    /// Identifier and dimensionality of the active vectorizer.
    pub fn vectorizer_info(&self) -> (String, usize) {
        let state = self.state.read();
        let vectorizer = &state.settings.vectorizer;
        (vectorizer.model_name().to_string(), vectorizer.dims())
    }
}

impl Default for RetrievalEngine {
    fn default() -> Self {
        Self::new(EngineParams::default())
    }
}

fn hashing_vectorizer(params: &EngineParams) -> Arc<CachedVectorizer> {
    Arc::new(CachedVectorizer::new(
        Box::new(HashingVectorizer::new(params.hashing.clone())),
        params.cache_capacity,
    ))
}

fn rebuild(index: &mut Index, settings: &Settings) {
    index.rebuild(|document| {
        build_document(
            document,
            &settings.params.chunking,
            settings.vectorizer.as_ref(),
        )
    });
}
