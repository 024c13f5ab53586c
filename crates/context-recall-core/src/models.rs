//! Core data models shared by the index, query engine, and assembler.

use serde::Serialize;
use std::sync::Arc;

/// A fixed-length embedding vector.
///
/// Shared by reference count so that a cache hit hands out the very same
/// allocation; vectors are never mutated after construction.
pub type Vector = Arc<[f32]>;

/// A whole source text unit, as submitted by the caller.
///
/// The index keeps its own copy of `content` so that [`reindex_all`]
/// can rebuild passages without the caller resupplying text.
///
/// [`reindex_all`]: crate::RetrievalEngine::reindex_all
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Opaque, externally assigned identifier.
    pub id: String,
    /// Display label, usually the source file name.
    pub name: String,
    /// Full raw text.
    pub content: String,
}

/// A bounded excerpt of a [`Document`] used as the unit of retrieval.
#[derive(Debug, Clone)]
pub struct Passage {
    /// SHA-256 hex digest of `text`.
    pub id: String,
    /// Owning document id (look-up only).
    pub document_id: String,
    /// Position within the owning document, starting at 0.
    pub index: usize,
    pub text: String,
}

/// A ranked passage produced by a search. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub passage_id: String,
    pub document_id: String,
    /// Name of the source document, used as the citation label.
    pub source: String,
    pub content: String,
    pub score: f32,
}

/// Corpus size counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub document_count: usize,
    pub passage_count: usize,
}

/// Lightweight listing entry for an indexed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub name: String,
    pub content_chars: usize,
    pub passage_count: usize,
}
