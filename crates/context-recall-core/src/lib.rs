//! # Context Recall Core
//!
//! In-memory retrieval engine for Context Recall: data models, tokenizer,
//! paragraph chunker, hashing vectorizer with a content-addressed cache,
//! hybrid (vector + keyword) scorer, document index, query engine, and
//! budgeted context assembly.
//!
//! This crate contains no tokio, filesystem I/O, or network dependencies.
//! Every operation is synchronous and CPU-bound; callers that need a time
//! bound wrap calls in their own cancellable task.
//!
//! ## Data Flow
//!
//! ```text
//! document text ──▶ chunk ──▶ Vectorizer ──▶ Index
//!                                             │
//! query ──▶ Vectorizer ──▶ search (reads Index) ──▶ context ──▶ String
//! ```
//!
//! ## Example
//!
//! ```rust
//! use context_recall_core::{EngineParams, RetrievalEngine};
//!
//! let engine = RetrievalEngine::new(EngineParams::default());
//! engine.add_document(
//!     "a",
//!     "notes.txt",
//!     "Alpha team ships Friday.\n\nBeta team ships Monday.",
//! );
//!
//! let results = engine.search("Friday", 3);
//! assert_eq!(results[0].source, "notes.txt");
//! assert!(engine.get_relevant_context("Friday", 4000).contains("Alpha team ships Friday."));
//! ```

pub mod chunk;
pub mod context;
pub mod embedding;
pub mod engine;
pub mod index;
pub mod models;
pub mod params;
pub mod score;
pub mod search;
pub mod tokenize;

pub use engine::RetrievalEngine;
pub use models::{Document, DocumentSummary, IndexStats, Passage, SearchResult, Vector};
pub use params::EngineParams;
