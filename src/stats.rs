//! Index statistics and document listing.
//!
//! `recall stats` summarizes what the configured corpus produces: document
//! and passage counts, embedding cache behavior, and the active vectorizer.
//! `recall documents` lists every loaded document.

use anyhow::Result;
use context_recall_core::embedding::CacheStats;
use context_recall_core::IndexStats;
use serde::Serialize;

use crate::config::Config;
use crate::service::ContextService;

#[derive(Debug, Serialize)]
struct StatsReport {
    #[serde(flatten)]
    index: IndexStats,
    ready: bool,
    enabled: bool,
    vectorizer: String,
    dims: usize,
    cache: CacheStats,
}

/// Run the stats command: index the corpus and print a summary.
pub async fn run_stats(config: &Config, json: bool) -> Result<()> {
    let service = ContextService::open(config).await?;
    let engine = service.engine();
    let (vectorizer, dims) = engine.vectorizer_info();

    let report = StatsReport {
        index: engine.stats(),
        ready: engine.is_ready(),
        enabled: engine.is_enabled(),
        vectorizer,
        dims,
        cache: engine.cache_stats(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Context Recall: Index Stats");
    println!("============================");
    println!();
    if let Some(corpus) = &config.corpus {
        println!("  Corpus:      {}", corpus.root.display());
    }
    println!("  Documents:   {}", report.index.document_count);
    println!("  Passages:    {}", report.index.passage_count);
    println!("  Ready:       {}", yes_no(report.ready));
    println!("  Enabled:     {}", yes_no(report.enabled));
    println!();
    println!("  Vectorizer:  {} ({} dims)", report.vectorizer, report.dims);
    println!(
        "  Cache:       {} entries, {} hits / {} misses ({}% hit rate)",
        report.cache.entries,
        report.cache.hits,
        report.cache.misses,
        hit_rate(&report.cache)
    );
    println!();

    Ok(())
}

/// Run the documents command: list loaded documents with passage counts.
pub async fn run_documents(config: &Config) -> Result<()> {
    let service = ContextService::open(config).await?;
    let documents = service.engine().documents();

    if documents.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    println!("  {:<40} {:>8} {:>8}", "DOCUMENT", "CHARS", "PASSAGES");
    println!("  {}", "-".repeat(58));
    for doc in &documents {
        println!(
            "  {:<40} {:>8} {:>8}",
            doc.id, doc.content_chars, doc.passage_count
        );
    }
    println!();
    println!("  {} document(s)", documents.len());

    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn hit_rate(cache: &CacheStats) -> u64 {
    let total = cache.hits + cache.misses;
    if total > 0 {
        (cache.hits * 100) / total
    } else {
        0
    }
}
