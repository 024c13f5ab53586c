//! Filesystem corpus loader.
//!
//! Walks `[corpus] root`, keeps files matching the include globs and not
//! matching the exclude globs, and reads each as a [`SourceDocument`]. The
//! document id is the path relative to the root; the name is the file name.

use anyhow::{anyhow, bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{Config, CorpusConfig};

/// A file read from the corpus, ready to hand to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Path relative to the corpus root, with `/` separators.
    pub id: String,
    /// File name, used as the citation label.
    pub name: String,
    pub content: String,
}

/// Scan the configured corpus.
pub fn load_corpus(config: &Config) -> Result<Vec<SourceDocument>> {
    let corpus = config
        .corpus
        .as_ref()
        .ok_or_else(|| anyhow!("Corpus not configured: add a [corpus] section with a root"))?;
    scan_corpus(corpus)
}

pub fn scan_corpus(corpus: &CorpusConfig) -> Result<Vec<SourceDocument>> {
    let root = &corpus.root;
    if !root.exists() {
        bail!("Corpus root does not exist: {}", root.display());
    }

    let include_set = build_globset(&corpus.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(corpus.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&default_excludes)?;

    let mut documents = Vec::new();

    let walker = WalkDir::new(root).follow_links(corpus.follow_symlinks);
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }

        match read_document(path, &rel_str) {
            Ok(doc) => documents.push(doc),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable file"),
        }
    }

    // Sort for deterministic ordering
    documents.sort_by(|a, b| a.id.cmp(&b.id));

    info!(root = %root.display(), documents = documents.len(), "corpus scanned");
    Ok(documents)
}

fn read_document(path: &Path, relative_path: &str) -> Result<SourceDocument> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes).into_owned();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| relative_path.to_string());

    Ok(SourceDocument {
        id: relative_path.to_string(),
        name,
        content,
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}
