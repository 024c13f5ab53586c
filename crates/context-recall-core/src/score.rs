//! Hybrid similarity scoring: vector similarity plus a lexical boost.
//!
//! Hashed bag-of-words vectors under-discriminate on short or
//! keyword-heavy queries, so the vector score is augmented with a boost
//! for every query word that literally occurs in the passage.
//!
//! # Formula
//!
//! ```text
//! vector  = q · p
//! overlap = min(per_dim × |{i : q[i] > ε ∧ p[i] > ε}|, overlap_cap)
//! keyword = Σ min(len(t) × per_char, keyword_cap)   for distinct query
//!           tokens t with len(t) > keyword_min_len found in lower(p_text)
//! total   = vector + overlap + keyword
//! ```

use serde::Serialize;
use std::collections::HashSet;

use crate::embedding::dot;
use crate::params::ScoringParams;
use crate::tokenize::significant_tokens;

/// The parts of a hybrid score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub vector: f32,
    pub overlap: f32,
    pub keyword: f32,
    pub total: f32,
}

/// Query-side state reused across every passage scored for one search.
///
/// Tokenizing the query once keeps the per-passage loop to a dot product
/// and a handful of substring checks.
#[derive(Debug, Clone)]
pub struct PreparedQuery<'a> {
    vector: &'a [f32],
    keywords: Vec<String>,
}

impl<'a> PreparedQuery<'a> {
    pub fn new(vector: &'a [f32], query_text: &str, params: &ScoringParams) -> Self {
        let mut seen = HashSet::new();
        let keywords = significant_tokens(query_text, params.keyword_min_len)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();
        Self { vector, keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Score one passage against a prepared query.
pub fn score_passage(
    query: &PreparedQuery<'_>,
    passage_vector: &[f32],
    passage_text: &str,
    params: &ScoringParams,
) -> ScoreBreakdown {
    let vector = dot(query.vector, passage_vector);
    let overlap = overlap_bonus(query.vector, passage_vector, params);
    let keyword = keyword_boost(&query.keywords, passage_text, params);
    ScoreBreakdown {
        vector,
        overlap,
        keyword,
        total: vector + overlap + keyword,
    }
}

/// Score a passage against a query in one call.
///
/// Convenience wrapper around [`PreparedQuery`] and [`score_passage`].
pub fn score(
    query_vector: &[f32],
    passage_vector: &[f32],
    query_text: &str,
    passage_text: &str,
    params: &ScoringParams,
) -> ScoreBreakdown {
    let prepared = PreparedQuery::new(query_vector, query_text, params);
    score_passage(&prepared, passage_vector, passage_text, params)
}

/// Bonus for dimensions active in both vectors.
pub fn overlap_bonus(a: &[f32], b: &[f32], params: &ScoringParams) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let shared = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| **x > params.overlap_epsilon && **y > params.overlap_epsilon)
        .count();
    (shared as f32 * params.overlap_bonus_per_dim).min(params.overlap_bonus_cap)
}

/// Lexical boost for query keywords found verbatim in the passage.
pub fn keyword_boost(keywords: &[String], passage_text: &str, params: &ScoringParams) -> f32 {
    if keywords.is_empty() {
        return 0.0;
    }
    let haystack = passage_text.to_lowercase();
    keywords
        .iter()
        .filter(|k| haystack.contains(k.as_str()))
        .map(|k| (k.chars().count() as f32 * params.keyword_boost_per_char).min(params.keyword_boost_cap))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ScoringParams {
        ScoringParams::default()
    }

    #[test]
    fn test_keyword_boost_scales_with_length_and_caps() {
        let p = params();
        let kw = vec!["ship".to_string()];
        assert!((keyword_boost(&kw, "We SHIP today", &p) - 0.08).abs() < 1e-6);

        let long = vec!["internationalization".to_string()];
        assert!((keyword_boost(&long, "internationalization", &p) - p.keyword_boost_cap).abs() < 1e-6);
    }

    #[test]
    fn test_keyword_boost_ignores_short_tokens() {
        let prepared = PreparedQuery::new(&[], "the cat ran far", &params());
        assert!(prepared.keywords().is_empty());
    }

    #[test]
    fn test_keyword_boost_counts_each_token_once() {
        let prepared = PreparedQuery::new(&[], "deploy deploy DEPLOY", &params());
        assert_eq!(prepared.keywords(), ["deploy".to_string()]);
    }

    #[test]
    fn test_keyword_matches_substring() {
        let kw = vec!["ship".to_string()];
        assert!(keyword_boost(&kw, "shipping soon", &params()) > 0.0);
    }

    #[test]
    fn test_overlap_bonus_counts_shared_active_dims() {
        let a = [0.6, 0.6, 0.0, 0.5];
        let b = [0.7, 0.0, 0.7, 0.1];
        assert!((overlap_bonus(&a, &b, &params()) - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_overlap_bonus_capped() {
        let a = vec![0.1f32; 100];
        assert!((overlap_bonus(&a, &a, &params()) - params().overlap_bonus_cap).abs() < 1e-6);
    }

    #[test]
    fn test_total_is_sum_of_parts() {
        let q = [1.0, 0.0];
        let p = [0.8, 0.6];
        let s = score(&q, &p, "release notes", "The release is out", &params());
        assert!((s.vector - 0.8).abs() < 1e-6);
        assert!((s.total - (s.vector + s.overlap + s.keyword)).abs() < 1e-6);
        assert!(s.keyword > 0.0);
    }

    #[test]
    fn test_zero_vectors_score_zero_without_keywords() {
        let zero = [0.0f32; 8];
        let s = score(&zero, &zero, "", "anything at all", &params());
        assert_eq!(s.total, 0.0);
    }
}
