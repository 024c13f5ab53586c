//! `recall search` and `recall context`.

use anyhow::Result;
use context_recall_core::SearchResult;

use crate::config::Config;
use crate::service::ContextService;

pub async fn run_search(config: &Config, query: &str, limit: Option<usize>, json: bool) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let service = ContextService::open(config).await?;
    let limit = limit.unwrap_or(config.retrieval.default_top_k);
    let results = service.search(query, limit).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    print_results(&results);
    Ok(())
}

pub async fn run_context(config: &Config, query: &str, max_chars: Option<usize>) -> Result<()> {
    let service = ContextService::open(config).await?;
    let max_chars = max_chars.unwrap_or(config.context.max_chars);
    let context = service.relevant_context(query, max_chars).await;

    if context.is_empty() {
        eprintln!("No relevant context.");
    } else {
        println!("{}", context);
    }
    Ok(())
}

fn print_results(results: &[SearchResult]) {
    for (i, result) in results.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, result.score, result.source);
        println!("    document: {}", result.document_id);
        println!("    excerpt: \"{}\"", excerpt(&result.content, 160));
        println!("    passage: {}", result.passage_id);
        println!();
    }
}

/// Single-line excerpt of at most `max` chars.
fn excerpt(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}
