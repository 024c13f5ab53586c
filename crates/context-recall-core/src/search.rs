//! Query engine: classification, adaptive threshold, ranking, fallback.
//!
//! # Algorithm
//!
//! 1. Vectorize the query.
//! 2. Classify it: *short* when it has at most `short_query_max_tokens`
//!    significant tokens, and *specific* when it mentions one of the
//!    configured specific terms.
//! 3. Pick the threshold: `short_query_threshold` for short or specific
//!    queries, `default_threshold` otherwise. Hashed vectors of short
//!    queries are sparse and score low, so they get the lower bar.
//! 4. Score every passage and keep those strictly above the threshold.
//! 5. Stable sort descending (ties keep insertion order).
//! 6. Truncate to `top_k`, raised to `specific_term_top_k` for specific
//!    queries.
//! 7. If nothing survived and a specific term was detected, return the
//!    first passage of every document whose name contains the term.

use tracing::debug;

use crate::embedding::Vectorizer;
use crate::index::Index;
use crate::models::SearchResult;
use crate::params::{EngineParams, SearchParams};
use crate::score::{score_passage, PreparedQuery};
use crate::tokenize::{normalize, significant_tokens};

/// Significant tokens for query classification are longer than this.
const CLASSIFY_MIN_TOKEN_LEN: usize = 2;

/// How a query will be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub short: bool,
    /// The first configured specific term the query mentions.
    pub specific_term: Option<String>,
    pub threshold: f32,
    /// Effective result limit.
    pub limit: usize,
}

/// Classify `query` and derive its threshold and limit.
pub fn plan_query(query: &str, top_k: usize, params: &SearchParams) -> QueryPlan {
    let short =
        significant_tokens(query, CLASSIFY_MIN_TOKEN_LEN).len() <= params.short_query_max_tokens;
    let specific_term = find_specific_term(query, &params.specific_terms).map(str::to_string);

    let threshold = if short || specific_term.is_some() {
        params.short_query_threshold
    } else {
        params.default_threshold
    };

    let limit = match (&specific_term, top_k) {
        (_, 0) => 0,
        (Some(_), k) => k.max(params.specific_term_top_k),
        (None, k) => k,
    };

    QueryPlan {
        short,
        specific_term,
        threshold,
        limit,
    }
}

/// The first term in `terms` that occurs in `query` as a whole token or
/// token sequence, compared after normalization.
pub fn find_specific_term<'a>(query: &str, terms: &'a [String]) -> Option<&'a str> {
    let padded_query = format!(" {} ", normalize(query));
    terms.iter().map(String::as_str).find(|term| {
        let needle = normalize(term);
        !needle.is_empty() && padded_query.contains(&format!(" {} ", needle))
    })
}

/// Rank the passages of `index` against `query`.
pub fn search(
    index: &Index,
    vectorizer: &dyn Vectorizer,
    params: &EngineParams,
    query: &str,
    top_k: usize,
) -> Vec<SearchResult> {
    if !index.is_ready() {
        return Vec::new();
    }

    let plan = plan_query(query, top_k, &params.search);
    if plan.limit == 0 {
        return Vec::new();
    }

    let query_vector = vectorizer.embed(query);
    let prepared = PreparedQuery::new(&query_vector, query, &params.scoring);

    let mut results: Vec<SearchResult> = index
        .passages()
        .filter_map(|(document, indexed)| {
            let breakdown =
                score_passage(&prepared, &indexed.vector, &indexed.passage.text, &params.scoring);
            (breakdown.total > plan.threshold).then(|| SearchResult {
                passage_id: indexed.passage.id.clone(),
                document_id: document.id.clone(),
                source: document.name.clone(),
                content: indexed.passage.text.clone(),
                score: breakdown.total,
            })
        })
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(plan.limit);

    let mut used_fallback = false;
    if results.is_empty() {
        if let Some(term) = &plan.specific_term {
            results = name_fallback(index, term, plan.limit, params.search.fallback_score);
            used_fallback = !results.is_empty();
        }
    }

    debug!(
        short = plan.short,
        specific_term = plan.specific_term.as_deref().unwrap_or(""),
        threshold = plan.threshold,
        limit = plan.limit,
        results = results.len(),
        fallback = used_fallback,
        "search"
    );

    results
}

/// First passage of every document whose name contains `term`.
fn name_fallback(index: &Index, term: &str, limit: usize, score: f32) -> Vec<SearchResult> {
    let needle = term.to_lowercase();
    index
        .documents()
        .filter(|entry| entry.document.name.to_lowercase().contains(&needle))
        .filter_map(|entry| {
            entry.passages.first().map(|first| SearchResult {
                passage_id: first.passage.id.clone(),
                document_id: entry.document.id.clone(),
                source: entry.document.name.clone(),
                content: first.passage.text.clone(),
                score,
            })
        })
        .take(limit)
        .collect()
}
