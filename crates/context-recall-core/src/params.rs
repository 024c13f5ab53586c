//! Tuning parameters, decoupled from application config.
//!
//! Every threshold, boost, and size used by the engine lives here as a
//! named field. The defaults are an empirically reasonable starting point,
//! not a derivation; applications override them from their own config.

use anyhow::{bail, Result};

/// What the chunker does with a single paragraph longer than the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OversizePolicy {
    /// Emit the paragraph as one oversized passage.
    Keep,
    /// Hard-split into `target_chars` windows sharing `overlap_chars`.
    Split { overlap_chars: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkParams {
    /// Target passage length in chars.
    pub target_chars: usize,
    pub oversize: OversizePolicy,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            target_chars: 1000,
            oversize: OversizePolicy::Split { overlap_chars: 100 },
        }
    }
}

/// Parameters of the hashing pseudo-embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct HashingParams {
    /// Vector dimensionality.
    pub dims: usize,
    /// Tokens of this many chars or fewer are discarded.
    pub min_token_len: usize,
    /// A token of `base_token_len` chars contributes weight 1.0.
    pub base_token_len: usize,
    /// Upper bound on a single token's length multiplier.
    pub max_length_multiplier: f32,
    /// Fraction of a token's weight added to each adjacent index.
    pub neighbor_fraction: f32,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            dims: 512,
            min_token_len: 2,
            base_token_len: 5,
            max_length_multiplier: 2.0,
            neighbor_fraction: 0.5,
        }
    }
}

/// Parameters of the hybrid similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringParams {
    /// A component counts as active above this magnitude.
    pub overlap_epsilon: f32,
    /// Bonus per dimension active in both vectors.
    pub overlap_bonus_per_dim: f32,
    pub overlap_bonus_cap: f32,
    /// Query tokens of this many chars or fewer earn no keyword boost.
    pub keyword_min_len: usize,
    /// Boost per char of a matched query token.
    pub keyword_boost_per_char: f32,
    /// Maximum boost a single matched token can earn.
    pub keyword_boost_cap: f32,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            overlap_epsilon: 0.05,
            overlap_bonus_per_dim: 0.005,
            overlap_bonus_cap: 0.05,
            keyword_min_len: 3,
            keyword_boost_per_char: 0.02,
            keyword_boost_cap: 0.15,
        }
    }
}

/// Query classification, thresholds, and result limits.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Queries with at most this many significant tokens are "short".
    pub short_query_max_tokens: usize,
    /// Relevance threshold for short or specific-term queries.
    pub short_query_threshold: f32,
    /// Relevance threshold for every other query.
    pub default_threshold: f32,
    /// Result limit used by `get_relevant_context`.
    pub default_top_k: usize,
    /// Result limit floor when a specific term is detected.
    pub specific_term_top_k: usize,
    /// High-value keywords that must never be silently missed.
    pub specific_terms: Vec<String>,
    /// Score given to name-matched fallback results.
    pub fallback_score: f32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            short_query_max_tokens: 3,
            short_query_threshold: 0.15,
            default_threshold: 0.25,
            default_top_k: 5,
            specific_term_top_k: 8,
            specific_terms: Vec::new(),
            fallback_score: 1.0,
        }
    }
}

/// Context assembly budget refinements.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextParams {
    /// Condense when the naive rendering exceeds `max_chars × condense_ratio`.
    pub condense_ratio: f32,
    /// Passage preview length used when condensing.
    pub preview_chars: usize,
}

impl Default for ContextParams {
    fn default() -> Self {
        Self {
            condense_ratio: 1.5,
            preview_chars: 600,
        }
    }
}

/// All engine parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineParams {
    pub chunking: ChunkParams,
    pub hashing: HashingParams,
    pub scoring: ScoringParams,
    pub search: SearchParams,
    pub context: ContextParams,
    /// Embedding cache capacity; `None` is unbounded.
    pub cache_capacity: Option<usize>,
}

impl EngineParams {
    /// Reject parameter combinations the engine cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.target_chars == 0 {
            bail!("chunking.target_chars must be > 0");
        }
        if let OversizePolicy::Split { overlap_chars } = self.chunking.oversize {
            if overlap_chars >= self.chunking.target_chars {
                bail!(
                    "chunking.overlap_chars ({}) must be < chunking.target_chars ({})",
                    overlap_chars,
                    self.chunking.target_chars
                );
            }
        }

        if self.hashing.dims == 0 {
            bail!("embedding.dims must be > 0");
        }
        if self.hashing.base_token_len == 0 {
            bail!("embedding.base_token_len must be > 0");
        }
        if self.hashing.max_length_multiplier <= 0.0 {
            bail!("embedding.max_length_multiplier must be > 0");
        }
        if !(0.0..=1.0).contains(&self.hashing.neighbor_fraction) {
            bail!("embedding.neighbor_fraction must be in [0.0, 1.0]");
        }

        if self.search.short_query_threshold > self.search.default_threshold {
            bail!(
                "retrieval.short_query_threshold ({}) must be <= retrieval.default_threshold ({})",
                self.search.short_query_threshold,
                self.search.default_threshold
            );
        }
        if self.search.default_top_k == 0 {
            bail!("retrieval.default_top_k must be >= 1");
        }

        if self.context.condense_ratio < 1.0 {
            bail!("context.condense_ratio must be >= 1.0");
        }
        if self.context.preview_chars == 0 {
            bail!("context.preview_chars must be > 0");
        }

        if self.cache_capacity == Some(0) {
            bail!("cache.max_entries must be > 0 when set");
        }

        Ok(())
    }
}
