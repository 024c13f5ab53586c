//! In-memory document index.
//!
//! Maps document id to the document and its vectorized passages, and keeps
//! an insertion order that defines the flattened passage view. The index
//! itself is not synchronized; [`RetrievalEngine`](crate::RetrievalEngine)
//! guards it with a lock so that every mutation is atomic for readers.

use std::collections::HashMap;

use crate::chunk::chunk_text;
use crate::embedding::Vectorizer;
use crate::models::{Document, DocumentSummary, IndexStats, Passage, Vector};
use crate::params::ChunkParams;

/// A passage together with its vector.
#[derive(Debug, Clone)]
pub struct IndexedPassage {
    pub passage: Passage,
    pub vector: Vector,
}

/// A document and every passage derived from its content.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub document: Document,
    pub passages: Vec<IndexedPassage>,
}

impl StoredDocument {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.document.id.clone(),
            name: self.document.name.clone(),
            content_chars: self.document.content.chars().count(),
            passage_count: self.passages.len(),
        }
    }
}

/// Chunk and vectorize `document` into a ready-to-insert entry.
///
/// Pure with respect to the index, so callers can run it without holding
/// the index lock.
pub fn build_document(
    document: Document,
    chunking: &ChunkParams,
    vectorizer: &dyn Vectorizer,
) -> StoredDocument {
    let passages = chunk_text(&document.id, &document.content, chunking)
        .into_iter()
        .map(|passage| {
            let vector = vectorizer.embed(&passage.text);
            IndexedPassage { passage, vector }
        })
        .collect();
    StoredDocument { document, passages }
}

#[derive(Debug, Default)]
pub struct Index {
    documents: HashMap<String, StoredDocument>,
    order: Vec<String>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry`, replacing any document with the same id.
    ///
    /// A replaced document moves to the end of the insertion order.
    pub fn insert(&mut self, entry: StoredDocument) -> Option<StoredDocument> {
        let id = entry.document.id.clone();
        let previous = self.documents.insert(id.clone(), entry);
        if previous.is_some() {
            self.order.retain(|existing| existing != &id);
        }
        self.order.push(id);
        previous
    }

    /// Remove a document and all its passages.
    pub fn remove(&mut self, id: &str) -> Option<StoredDocument> {
        let removed = self.documents.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&StoredDocument> {
        self.documents.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut StoredDocument> {
        self.documents.get_mut(id)
    }

    /// The stored copy of a document.
    pub fn document(&self, id: &str) -> Option<&Document> {
        self.get(id).map(|entry| &entry.document)
    }

    /// Stored documents in insertion order.
    pub fn documents(&self) -> impl Iterator<Item = &StoredDocument> {
        self.order.iter().filter_map(|id| self.documents.get(id))
    }

    /// Every passage, flattened in document insertion order.
    pub fn passages(&self) -> impl Iterator<Item = (&Document, &IndexedPassage)> {
        self.documents()
            .flat_map(|entry| entry.passages.iter().map(move |p| (&entry.document, p)))
    }

    /// Rebuild every document's passages from its stored content, keeping
    /// insertion order.
    pub fn rebuild<F>(&mut self, mut build: F)
    where
        F: FnMut(Document) -> StoredDocument,
    {
        for id in &self.order {
            if let Some(entry) = self.documents.get_mut(id) {
                let document = entry.document.clone();
                *entry = build(document);
            }
        }
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            document_count: self.documents.len(),
            passage_count: self.documents.values().map(|e| e.passages.len()).sum(),
        }
    }

    /// True iff at least one document has at least one passage.
    pub fn is_ready(&self) -> bool {
        self.documents.values().any(|e| !e.passages.is_empty())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingVectorizer;
    use crate::params::HashingParams;

    fn entry(id: &str, content: &str) -> StoredDocument {
        let vectorizer = HashingVectorizer::new(HashingParams::default());
        build_document(
            Document {
                id: id.to_string(),
                name: format!("{}.txt", id),
                content: content.to_string(),
            },
            &ChunkParams::default(),
            &vectorizer,
        )
    }

    fn passage_docs(index: &Index) -> Vec<String> {
        index
            .passages()
            .map(|(doc, _)| doc.id.clone())
            .collect()
    }

    #[test]
    fn test_build_document_vectorizes_every_passage() {
        let stored = entry("a", "First paragraph.\n\nSecond paragraph.");
        assert_eq!(stored.passages.len(), 1);
        assert_eq!(stored.passages[0].vector.len(), 512);
    }

    #[test]
    fn test_insert_and_stats() {
        let mut index = Index::new();
        assert!(!index.is_ready());
        index.insert(entry("a", "Alpha content"));
        index.insert(entry("b", "Beta content"));
        let stats = index.stats();
        assert_eq!(stats.document_count, 2);
        assert_eq!(stats.passage_count, 2);
        assert!(index.is_ready());
    }

    #[test]
    fn test_empty_document_is_stored_but_not_ready() {
        let mut index = Index::new();
        index.insert(entry("blank", "   \n\n  "));
        assert_eq!(index.len(), 1);
        assert!(!index.is_ready());
    }

    #[test]
    fn test_replace_moves_document_to_end() {
        let mut index = Index::new();
        index.insert(entry("a", "Alpha"));
        index.insert(entry("b", "Beta"));
        let previous = index.insert(entry("a", "Alpha revised"));
        assert!(previous.is_some());
        assert_eq!(passage_docs(&index), vec!["b", "a"]);
        assert_eq!(index.stats().document_count, 2);
    }

    #[test]
    fn test_remove_drops_all_passages() {
        let mut index = Index::new();
        index.insert(entry("a", "One.\n\nTwo."));
        index.insert(entry("b", "Three."));
        assert!(index.remove("a").is_some());
        assert!(index.remove("a").is_none());
        assert!(passage_docs(&index).iter().all(|id| id == "b"));
        assert!(index.document("a").is_none());
    }

    #[test]
    fn test_rebuild_keeps_order_and_content() {
        let mut index = Index::new();
        index.insert(entry("a", "Alpha"));
        index.insert(entry("b", "Beta"));
        let mut seen = Vec::new();
        index.rebuild(|doc| {
            seen.push(doc.id.clone());
            entry(&doc.id, &doc.content)
        });
        assert_eq!(seen, vec!["a", "b"]);
        assert_eq!(index.document("b").map(|d| d.content.as_str()), Some("Beta"));
    }
}
