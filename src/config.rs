//! TOML configuration.
//!
//! Every section and field has a default, so an empty file is a valid
//! config. Engine tuning maps onto [`EngineParams`] via
//! [`Config::engine_params`].
//!
//! ```toml
//! [chunking]
//! target_chars = 1000
//! oversize = "split"
//! overlap_chars = 100
//!
//! [retrieval]
//! short_query_threshold = 0.15
//! default_threshold = 0.25
//! specific_terms = ["SLA", "runbook"]
//!
//! [corpus]
//! root = "./docs"
//! ```

use anyhow::{bail, Context, Result};
use context_recall_core::params::{
    ChunkParams, ContextParams, EngineParams, HashingParams, OversizePolicy, ScoringParams,
    SearchParams,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub corpus: Option<CorpusConfig>,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OversizeMode {
    Keep,
    #[default]
    Split,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_target_chars")]
    pub target_chars: usize,
    #[serde(default)]
    pub oversize: OversizeMode,
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_chars: default_target_chars(),
            oversize: OversizeMode::default(),
            overlap_chars: default_overlap_chars(),
        }
    }
}

fn default_target_chars() -> usize {
    1000
}
fn default_overlap_chars() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
    #[serde(default = "default_base_token_len")]
    pub base_token_len: usize,
    #[serde(default = "default_max_length_multiplier")]
    pub max_length_multiplier: f32,
    #[serde(default = "default_neighbor_fraction")]
    pub neighbor_fraction: f32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dims: default_dims(),
            min_token_len: default_min_token_len(),
            base_token_len: default_base_token_len(),
            max_length_multiplier: default_max_length_multiplier(),
            neighbor_fraction: default_neighbor_fraction(),
        }
    }
}

fn default_dims() -> usize {
    512
}
fn default_min_token_len() -> usize {
    2
}
fn default_base_token_len() -> usize {
    5
}
fn default_max_length_multiplier() -> f32 {
    2.0
}
fn default_neighbor_fraction() -> f32 {
    0.5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_short_query_max_tokens")]
    pub short_query_max_tokens: usize,
    #[serde(default = "default_short_query_threshold")]
    pub short_query_threshold: f32,
    #[serde(default = "default_threshold")]
    pub default_threshold: f32,
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "default_specific_term_top_k")]
    pub specific_term_top_k: usize,
    #[serde(default)]
    pub specific_terms: Vec<String>,
    #[serde(default = "default_fallback_score")]
    pub fallback_score: f32,
    #[serde(default = "default_overlap_epsilon")]
    pub overlap_epsilon: f32,
    #[serde(default = "default_overlap_bonus_per_dim")]
    pub overlap_bonus_per_dim: f32,
    #[serde(default = "default_overlap_bonus_cap")]
    pub overlap_bonus_cap: f32,
    #[serde(default = "default_keyword_min_len")]
    pub keyword_min_len: usize,
    #[serde(default = "default_keyword_boost_per_char")]
    pub keyword_boost_per_char: f32,
    #[serde(default = "default_keyword_boost_cap")]
    pub keyword_boost_cap: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            short_query_max_tokens: default_short_query_max_tokens(),
            short_query_threshold: default_short_query_threshold(),
            default_threshold: default_threshold(),
            default_top_k: default_top_k(),
            specific_term_top_k: default_specific_term_top_k(),
            specific_terms: Vec::new(),
            fallback_score: default_fallback_score(),
            overlap_epsilon: default_overlap_epsilon(),
            overlap_bonus_per_dim: default_overlap_bonus_per_dim(),
            overlap_bonus_cap: default_overlap_bonus_cap(),
            keyword_min_len: default_keyword_min_len(),
            keyword_boost_per_char: default_keyword_boost_per_char(),
            keyword_boost_cap: default_keyword_boost_cap(),
        }
    }
}

fn default_short_query_max_tokens() -> usize {
    3
}
fn default_short_query_threshold() -> f32 {
    0.15
}
fn default_threshold() -> f32 {
    0.25
}
fn default_top_k() -> usize {
    5
}
fn default_specific_term_top_k() -> usize {
    8
}
fn default_fallback_score() -> f32 {
    1.0
}
fn default_overlap_epsilon() -> f32 {
    0.05
}
fn default_overlap_bonus_per_dim() -> f32 {
    0.005
}
fn default_overlap_bonus_cap() -> f32 {
    0.05
}
fn default_keyword_min_len() -> usize {
    3
}
fn default_keyword_boost_per_char() -> f32 {
    0.02
}
fn default_keyword_boost_cap() -> f32 {
    0.15
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    /// Budget used by `recall context` when `--max-chars` is not given.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_condense_ratio")]
    pub condense_ratio: f32,
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            condense_ratio: default_condense_ratio(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_max_chars() -> usize {
    4000
}
fn default_condense_ratio() -> f32 {
    1.5
}
fn default_preview_chars() -> usize {
    600
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CacheConfig {
    /// Maximum cached vectors; unbounded when absent.
    #[serde(default)]
    pub max_entries: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.txt".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Upper bound on a single search or context request.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

fn default_query_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Defaults for every section and no corpus.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Map tuning sections onto core engine parameters.
    pub fn engine_params(&self) -> EngineParams {
        let oversize = match self.chunking.oversize {
            OversizeMode::Keep => OversizePolicy::Keep,
            OversizeMode::Split => OversizePolicy::Split {
                overlap_chars: self.chunking.overlap_chars,
            },
        };
        let r = &self.retrieval;

        EngineParams {
            chunking: ChunkParams {
                target_chars: self.chunking.target_chars,
                oversize,
            },
            hashing: HashingParams {
                dims: self.embedding.dims,
                min_token_len: self.embedding.min_token_len,
                base_token_len: self.embedding.base_token_len,
                max_length_multiplier: self.embedding.max_length_multiplier,
                neighbor_fraction: self.embedding.neighbor_fraction,
            },
            scoring: ScoringParams {
                overlap_epsilon: r.overlap_epsilon,
                overlap_bonus_per_dim: r.overlap_bonus_per_dim,
                overlap_bonus_cap: r.overlap_bonus_cap,
                keyword_min_len: r.keyword_min_len,
                keyword_boost_per_char: r.keyword_boost_per_char,
                keyword_boost_cap: r.keyword_boost_cap,
            },
            search: SearchParams {
                short_query_max_tokens: r.short_query_max_tokens,
                short_query_threshold: r.short_query_threshold,
                default_threshold: r.default_threshold,
                default_top_k: r.default_top_k,
                specific_term_top_k: r.specific_term_top_k,
                specific_terms: r.specific_terms.clone(),
                fallback_score: r.fallback_score,
            },
            context: ContextParams {
                condense_ratio: self.context.condense_ratio,
                preview_chars: self.context.preview_chars,
            },
            cache_capacity: self.cache.max_entries,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.engine_params().validate()?;

        if self.context.max_chars == 0 {
            bail!("context.max_chars must be > 0");
        }
        if self.service.query_timeout_ms == 0 {
            bail!("service.query_timeout_ms must be > 0");
        }
        if let Some(corpus) = &self.corpus {
            if corpus.include_globs.is_empty() {
                bail!("corpus.include_globs must not be empty");
            }
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    Ok(config)
}
