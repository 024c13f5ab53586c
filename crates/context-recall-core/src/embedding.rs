//! Vectorizer trait, the hashing pseudo-embedding, and the embedding cache.
//!
//! The [`Vectorizer`] trait is the seam where a real embedding model can be
//! substituted: the index, scorer, and query engine only ever see vectors.
//! [`HashingVectorizer`] is the dependency-free default. It maps every
//! significant token to a bucket by hashing, so it is deterministic and
//! needs no model files, at the price of semantic quality.
//!
//! [`CachedVectorizer`] memoizes any vectorizer by the SHA-256 of the input
//! text, so repeated passages and queries are embedded once.

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::hash::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};
use twox_hash::XxHash64;

use crate::models::Vector;
use crate::params::HashingParams;
use crate::tokenize::significant_tokens;

/// Trait for embedding strategies.
///
/// Implementations must be deterministic for a given input and return
/// vectors of length [`dims`](Vectorizer::dims).
pub trait Vectorizer: Send + Sync {
    /// Returns the strategy identifier (e.g. `"hashing-v1"`).
    fn model_name(&self) -> &str;
    /// Returns the vector dimensionality.
    fn dims(&self) -> usize;
    /// Embed `text`. Text without usable tokens yields the zero vector.
    fn embed(&self, text: &str) -> Vector;
}

/// Hashed bag-of-words embedding with length weighting and neighbor spread.
///
/// For each token longer than `min_token_len` chars:
///
/// ```text
/// i       = xxh64(token) mod D
/// w       = min(len / base_token_len, max_length_multiplier)
/// v[i]   += w
/// v[i±1] += neighbor_fraction × w      (indices wrap around)
/// ```
///
/// The result is L2-normalized unless it is all zeros.
pub struct HashingVectorizer {
    params: HashingParams,
    name: String,
}

impl HashingVectorizer {
    pub fn new(params: HashingParams) -> Self {
        let name = format!("hashing-xxh64:d{}", params.dims);
        Self { params, name }
    }

    pub fn params(&self) -> &HashingParams {
        &self.params
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(token.as_bytes());
        (hasher.finish() % self.params.dims as u64) as usize
    }

    fn weight(&self, token: &str) -> f32 {
        let len = token.chars().count() as f32;
        (len / self.params.base_token_len as f32).min(self.params.max_length_multiplier)
    }
}

impl Vectorizer for HashingVectorizer {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn dims(&self) -> usize {
        self.params.dims
    }

    fn embed(&self, text: &str) -> Vector {
        let dims = self.params.dims;
        let mut v = vec![0.0f32; dims];
        if dims == 0 {
            return v.into();
        }

        for token in significant_tokens(text, self.params.min_token_len) {
            let idx = self.bucket(&token);
            let w = self.weight(&token);
            v[idx] += w;

            let spread = w * self.params.neighbor_fraction;
            if spread > 0.0 {
                v[(idx + dims - 1) % dims] += spread;
                v[(idx + 1) % dims] += spread;
            }
        }

        normalize(&mut v);
        v.into()
    }
}

/// Scale `v` to unit length in place. The zero vector is left unchanged.
pub fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Dot product of two vectors; `0.0` when lengths differ.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Hit/miss counters and current size of an [`EmbeddingCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

type CacheKey = [u8; 32];

#[derive(Default)]
struct CacheState {
    map: HashMap<CacheKey, Vector>,
    order: VecDeque<CacheKey>,
}

/// Content-addressed vector cache keyed by SHA-256 of the input text.
///
/// Entries are write-once: the first vector stored for a key is the one
/// every later lookup returns. With a capacity, the oldest entry is
/// evicted first. Losing entries only costs recomputation.
pub struct EmbeddingCache {
    state: RwLock<CacheState>,
    capacity: Option<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    /// Create a cache; `None` means unbounded.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn key(text: &str) -> CacheKey {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&hasher.finalize());
        key
    }

    /// Look up `text`, counting the hit or miss.
    pub fn get(&self, text: &str) -> Option<Vector> {
        let found = self.state.read().map.get(&Self::key(text)).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store `vector` for `text` unless an entry already exists, and return
    /// the entry that is now cached.
    pub fn insert(&self, text: &str, vector: Vector) -> Vector {
        let key = Self::key(text);
        let mut state = self.state.write();
        if let Some(existing) = state.map.get(&key) {
            return existing.clone();
        }
        if let Some(cap) = self.capacity {
            while state.map.len() >= cap {
                match state.order.pop_front() {
                    Some(oldest) => {
                        state.map.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
        state.map.insert(key, vector.clone());
        state.order.push_back(key);
        vector
    }

    pub fn len(&self) -> usize {
        self.state.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.state.write();
        state.map.clear();
        state.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// A [`Vectorizer`] wrapped with an [`EmbeddingCache`].
pub struct CachedVectorizer {
    inner: Box<dyn Vectorizer>,
    cache: EmbeddingCache,
}

impl CachedVectorizer {
    pub fn new(inner: Box<dyn Vectorizer>, capacity: Option<usize>) -> Self {
        Self {
            inner,
            cache: EmbeddingCache::new(capacity),
        }
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}

impl Vectorizer for CachedVectorizer {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dims(&self) -> usize {
        self.inner.dims()
    }

    fn embed(&self, text: &str) -> Vector {
        if let Some(hit) = self.cache.get(text) {
            return hit;
        }
        let vector = self.inner.embed(text);
        self.cache.insert(text, vector)
    }
}
